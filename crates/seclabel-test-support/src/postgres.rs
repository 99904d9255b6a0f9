//! Helpers for launching disposable Postgres instances for integration tests without Docker.

use std::fs;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use postgres::NoTls;
use url::Url;

/// Environment variable pointing at an existing server to create test databases on.
pub const TEST_DATABASE_URL_ENV: &str = "SECLABEL_TEST_DATABASE_URL";

/// Environment variable listing libraries to preload into a locally spawned server
/// (for example `anon` to load the anonymizer label provider).
pub const TEST_PRELOAD_ENV: &str = "SECLABEL_TEST_PRELOAD";

/// Handle to a disposable Postgres database used in tests.
pub struct TestDatabase {
    connection_string: String,
    process: Option<Child>,
    data_dir: Option<PathBuf>,
    cleanup: Option<DbCleanup>,
}

impl TestDatabase {
    /// Connection string that can be passed to `sqlx` or other Postgres clients.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Some(cleanup) = &self.cleanup {
            let _ = drop_database(cleanup);
        }
        if let Some(process) = &mut self.process {
            let _ = process.kill();
            let _ = process.wait();
        }
        if let Some(dir) = &self.data_dir {
            let _ = fs::remove_dir_all(dir);
        }
    }
}

struct DbCleanup {
    admin_url: String,
    database: String,
}

/// Start a disposable Postgres database.
///
/// This prefers an externally supplied server via `SECLABEL_TEST_DATABASE_URL`,
/// creating a uniquely named database on it. When unset, it will attempt to
/// use locally available Postgres binaries (`initdb`, `postgres`,
/// `pg_isready`) to spawn a temporary instance. Tests decide whether to skip
/// when this helper returns an error.
///
/// # Errors
///
/// Returns an error if no external URL is provided and Postgres binaries are
/// unavailable or fail to start.
pub fn start_postgres() -> Result<TestDatabase> {
    if let Ok(url) = std::env::var(TEST_DATABASE_URL_ENV) {
        let created = create_unique_database(&url)?;
        return Ok(TestDatabase {
            connection_string: created.connection_string,
            process: None,
            data_dir: None,
            cleanup: Some(DbCleanup {
                admin_url: created.admin_url,
                database: created.database,
            }),
        });
    }

    start_local_postgres()
}

fn start_local_postgres() -> Result<TestDatabase> {
    let binaries = ensure_binaries()?;

    let port = reserve_port()?;
    let data_dir = create_data_dir()?;
    let data_dir_arg = data_dir
        .to_str()
        .context("data dir contains non-utf8 characters")?
        .to_string();

    let initdb_status = Command::new(&binaries.initdb)
        .args(["-D", &data_dir_arg, "--username=postgres", "--auth=trust"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("failed to run initdb")?;
    if !initdb_status.success() {
        bail!("initdb exited with failure status");
    }

    let mut server = Command::new(&binaries.postgres);
    server.args([
        "-D",
        &data_dir_arg,
        "-p",
        &port.to_string(),
        "-h",
        "127.0.0.1",
    ]);
    if let Ok(preload) = std::env::var(TEST_PRELOAD_ENV) {
        server.arg("-c").arg(format!("shared_preload_libraries={preload}"));
    }
    let process = server
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to start postgres process")?;

    wait_for_ready(&binaries.pg_isready, port)?;

    let base_url = format!("postgres://postgres@127.0.0.1:{port}/postgres");
    let created = create_unique_database(&base_url)?;

    Ok(TestDatabase {
        connection_string: created.connection_string,
        process: Some(process),
        data_dir: Some(data_dir),
        cleanup: Some(DbCleanup {
            admin_url: created.admin_url,
            database: created.database,
        }),
    })
}

struct PostgresBinaries {
    initdb: PathBuf,
    postgres: PathBuf,
    pg_isready: PathBuf,
}

fn ensure_binaries() -> Result<PostgresBinaries> {
    Ok(PostgresBinaries {
        initdb: resolve_binary("initdb")?,
        postgres: resolve_binary("postgres")?,
        pg_isready: resolve_binary("pg_isready")?,
    })
}

fn resolve_binary(name: &str) -> Result<PathBuf> {
    let mut search_paths: Vec<PathBuf> = Vec::new();
    // Debian/Ubuntu keep server binaries outside PATH.
    for version in ["17", "16", "15", "14"] {
        search_paths.push(PathBuf::from(format!("/usr/lib/postgresql/{version}/bin")));
        search_paths.push(PathBuf::from(format!(
            "/opt/homebrew/opt/postgresql@{version}/bin"
        )));
    }
    search_paths.extend(
        std::env::var_os("PATH")
            .map_or_else(Vec::new, |paths| std::env::split_paths(&paths).collect()),
    );
    search_paths.extend([
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/opt/homebrew/bin"),
    ]);

    for dir in search_paths {
        let candidate = dir.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    bail!("{name} binary is required for Postgres tests");
}

fn reserve_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("failed to reserve port")?;
    let port = listener
        .local_addr()
        .context("failed to read listener address")?
        .port();
    drop(listener);
    Ok(port)
}

fn create_data_dir() -> Result<PathBuf> {
    let base = std::env::temp_dir().join("seclabel-pg");
    fs::create_dir_all(&base)
        .with_context(|| format!("failed to create base dir {}", base.display()))?;
    for attempt in 0..5 {
        let candidate = base.join(format!("cluster-{}-{attempt}", unique_suffix()));
        if !candidate.exists() {
            fs::create_dir_all(&candidate)
                .with_context(|| format!("failed to create data dir {}", candidate.display()))?;
            return Ok(candidate);
        }
    }
    bail!("failed to allocate temporary data directory for postgres");
}

fn wait_for_ready(pg_isready: &Path, port: u16) -> Result<()> {
    for _ in 0..30 {
        let status = Command::new(pg_isready)
            .args(["-h", "127.0.0.1", "-p", &port.to_string(), "-U", "postgres"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if matches!(status, Ok(ref s) if s.success()) {
            return Ok(());
        }
        thread::sleep(Duration::from_millis(200));
    }

    bail!("postgres process did not become ready in time")
}

struct CreatedDatabase {
    connection_string: String,
    admin_url: String,
    database: String,
}

fn create_unique_database(base_url: &str) -> Result<CreatedDatabase> {
    let parsed = Url::parse(base_url).context("invalid postgres connection url")?;
    let db_name = format!("seclabel_test_{}", unique_suffix());

    let mut database_url = parsed.clone();
    database_url.set_path(&format!("/{db_name}"));

    let mut last_error: Option<anyhow::Error> = None;
    for admin_url in admin_urls(&parsed) {
        match run_admin_statement(&admin_url, format!("CREATE DATABASE \"{db_name}\"")) {
            Ok(()) => {
                return Ok(CreatedDatabase {
                    connection_string: database_url.to_string(),
                    admin_url,
                    database: db_name,
                });
            }
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("failed to create database")))
}

fn admin_urls(base: &Url) -> Vec<String> {
    let mut urls = Vec::new();
    let mut admin = base.clone();
    admin.set_path("/postgres");
    urls.push(admin.to_string());
    // Fall back to the supplied database when `postgres` is not reachable.
    if admin.path() != base.path() {
        urls.push(base.to_string());
    }
    urls
}

fn drop_database(cleanup: &DbCleanup) -> Result<()> {
    run_admin_statement(
        &cleanup.admin_url,
        format!("DROP DATABASE IF EXISTS \"{}\"", cleanup.database),
    )
}

/// Run a single statement with the blocking client on a dedicated thread.
///
/// The blocking client drives its own runtime, which cannot nest inside the
/// `tokio` runtime of an async test.
pub(crate) fn run_admin_statement(url: &str, statement: String) -> Result<()> {
    let url = url.to_string();
    thread::spawn(move || -> Result<()> {
        let config = postgres::Config::from_str(&url)?;
        let mut client = config.connect(NoTls)?;
        client
            .simple_query(&statement)
            .map(|_| ())
            .with_context(|| format!("failed to run `{statement}`"))
    })
    .join()
    .unwrap_or_else(|_| Err(anyhow::anyhow!("admin statement thread panicked")))
}

pub(crate) fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let pid = std::process::id();
    format!("{pid}_{nanos}")
}
