//! Disposable roles, seeded catalog labels, and label provider probes for
//! integration suites.

use std::str::FromStr;
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use postgres::{Client, NoTls};

use crate::postgres::{run_admin_statement, unique_suffix};

/// A login-less role that is dropped when the guard goes out of scope.
///
/// Dropping a role also removes the labels attached to it, so suites do not
/// need to clear labels they leave behind.
pub struct TestRole {
    connection_string: String,
    name: String,
}

impl TestRole {
    /// Create a role named `<prefix>_<pid>_<nanos>` on the given database server.
    ///
    /// # Errors
    ///
    /// Returns an error when the server rejects the `CREATE ROLE` statement.
    pub fn create(connection_string: &str, prefix: &str) -> Result<Self> {
        let name = unique_name(prefix);
        run_admin_statement(connection_string, format!("CREATE ROLE \"{name}\""))
            .with_context(|| format!("failed to create test role {name}"))?;
        Ok(Self {
            connection_string: connection_string.to_string(),
            name,
        })
    }

    /// Name of the role, lowercase and safe to use unquoted.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TestRole {
    fn drop(&mut self) {
        let _ = run_admin_statement(
            &self.connection_string,
            format!("DROP ROLE IF EXISTS \"{}\"", self.name),
        );
    }
}

/// Build a lowercase object name unique to this process and instant.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix.to_ascii_lowercase(), unique_suffix())
}

/// Report whether `provider` is a loaded label provider on the server.
///
/// The probe clears a label on `role` inside a transaction that is always
/// rolled back, so it leaves no trace. Any failure, including an unreachable
/// server, reads as "not loaded".
#[must_use]
pub fn label_provider_loaded(connection_string: &str, provider: &str, role: &str) -> bool {
    let statement = format!("SECURITY LABEL FOR \"{provider}\" ON ROLE \"{role}\" IS NULL");
    with_client(connection_string, move |client| {
        let mut tx = client.transaction()?;
        tx.batch_execute(&statement)?;
        tx.rollback()?;
        Ok(())
    })
    .is_ok()
}

/// Report whether the connection string logs in as a superuser.
///
/// Seeding catalog rows directly needs superuser rights. Any failure reads as
/// "not a superuser".
#[must_use]
pub fn is_superuser(connection_string: &str) -> bool {
    with_client(connection_string, |client| {
        let row = client.query_one(
            "SELECT rolsuper FROM pg_roles WHERE rolname = current_user",
            &[],
        )?;
        Ok(row.get::<_, bool>(0))
    })
    .unwrap_or(false)
}

/// A label row written straight into `pg_seclabel` or `pg_shseclabel`.
///
/// No label provider needs to be loaded, which lets suites exercise catalog
/// reads against present labels on any server. The row is deleted when the
/// guard goes out of scope.
pub struct SeededLabel {
    connection_string: String,
    address: CatalogAddress,
    name: String,
    provider: String,
}

impl SeededLabel {
    /// Attach `label` for `provider` to the object `name` of kind `kind`
    /// (a `SECURITY LABEL` keyword such as `TABLE` or `MATERIALIZED VIEW`).
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown kind, a missing object, or a role
    /// without the rights to write the catalog.
    pub fn insert(
        connection_string: &str,
        kind: &str,
        name: &str,
        provider: &str,
        label: &str,
    ) -> Result<Self> {
        let address = CatalogAddress::for_kind(kind)?;
        let statement = address.insert_statement();
        let (object, owner, text) = (name.to_string(), provider.to_string(), label.to_string());
        with_client(connection_string, move |client| {
            client.execute(statement.as_str(), &[&object, &owner, &text])?;
            Ok(())
        })
        .with_context(|| format!("failed to seed {kind} {name} label"))?;

        Ok(Self {
            connection_string: connection_string.to_string(),
            address,
            name: name.to_string(),
            provider: provider.to_string(),
        })
    }
}

impl Drop for SeededLabel {
    fn drop(&mut self) {
        let statement = self.address.delete_statement();
        let (object, owner) = (self.name.clone(), self.provider.clone());
        let _ = with_client(&self.connection_string, move |client| {
            client.execute(statement.as_str(), &[&object, &owner])?;
            Ok(())
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CatalogAddress {
    shared: bool,
    class: &'static str,
    object_oid: &'static str,
}

impl CatalogAddress {
    fn for_kind(kind: &str) -> Result<Self> {
        let normalized = kind
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        let (shared, class, object_oid) = match normalized.as_str() {
            "ROLE" => (
                true,
                "pg_authid",
                "(SELECT oid FROM pg_roles WHERE rolname = $1::text)",
            ),
            "DATABASE" => (
                true,
                "pg_database",
                "(SELECT oid FROM pg_database WHERE datname = $1::text)",
            ),
            "TABLESPACE" => (
                true,
                "pg_tablespace",
                "(SELECT oid FROM pg_tablespace WHERE spcname = $1::text)",
            ),
            "SCHEMA" => (
                false,
                "pg_namespace",
                "(SELECT oid FROM pg_namespace WHERE nspname = $1::text)",
            ),
            "TABLE" | "VIEW" | "MATERIALIZED VIEW" | "FOREIGN TABLE" | "SEQUENCE" => {
                (false, "pg_class", "to_regclass($1::text)::oid")
            }
            "TYPE" | "DOMAIN" => (false, "pg_type", "to_regtype($1::text)::oid"),
            _ => bail!("no catalog address for object kind '{kind}'"),
        };
        Ok(Self {
            shared,
            class,
            object_oid,
        })
    }

    const fn table(self) -> &'static str {
        if self.shared {
            "pg_shseclabel"
        } else {
            "pg_seclabel"
        }
    }

    fn insert_statement(self) -> String {
        let (columns, subid) = if self.shared {
            ("objoid, classoid, provider, label", "")
        } else {
            ("objoid, classoid, objsubid, provider, label", "0, ")
        };
        format!(
            "INSERT INTO {} ({columns}) VALUES ({}, '{}'::regclass, {subid}$2::text, $3::text)",
            self.table(),
            self.object_oid,
            self.class,
        )
    }

    fn delete_statement(self) -> String {
        format!(
            "DELETE FROM {} WHERE objoid = {} AND classoid = '{}'::regclass AND provider = $2::text",
            self.table(),
            self.object_oid,
            self.class,
        )
    }
}

fn with_client<T, F>(connection_string: &str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Client) -> Result<T> + Send + 'static,
{
    let url = connection_string.to_string();
    thread::spawn(move || -> Result<T> {
        let config = postgres::Config::from_str(&url)?;
        let mut client = config.connect(NoTls)?;
        work(&mut client)
    })
    .join()
    .unwrap_or_else(|_| Err(anyhow!("postgres client thread panicked")))
}
