//! Argument parsing and command dispatch for the `seclabel` binary.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use seclabel_resource::ProviderConfig;
use seclabel_resource::config::DATABASE_URL_ENV;
use seclabel_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};

use crate::commands::lifecycle::{
    handle_create, handle_delete, handle_exists, handle_import, handle_read,
};
use crate::commands::plan::{handle_plan, handle_schema};
use crate::context::{AppContext, CliError, CliResult};

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format.unwrap_or_else(LogFormat::infer),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("error: {err}");
        return CliError::failure(err).exit_code();
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let output = cli.output;
    match cli.command {
        Command::Schema => handle_schema(output),
        Command::Plan(args) => handle_plan(&args, output),
        Command::Create(args) => handle_create(&connect(&cli.connection, output).await?, args).await,
        Command::Read(args) => handle_read(&connect(&cli.connection, output).await?, args).await,
        Command::Delete(args) => handle_delete(&connect(&cli.connection, output).await?, args).await,
        Command::Exists(args) => handle_exists(&connect(&cli.connection, output).await?, args).await,
        Command::Import(args) => handle_import(&connect(&cli.connection, output).await?, args).await,
    }
}

async fn connect(args: &ConnectionArgs, output: OutputFormat) -> CliResult<AppContext> {
    let config = provider_config(args)?;
    AppContext::connect(&config, output).await
}

/// Resolve connection settings: flags first, then `SECLABEL_*` variables,
/// then `DATABASE_URL`.
pub(crate) fn provider_config(args: &ConnectionArgs) -> CliResult<ProviderConfig> {
    let mut config = ProviderConfig::from_lookup(|name| {
        if name == DATABASE_URL_ENV {
            args.database_url.clone()
        } else {
            env::var(name).ok()
        }
    })
    .map_err(|err| CliError::validation(err.to_string()))?;

    if let Some(max) = args.max_connections {
        if max == 0 {
            return Err(CliError::validation(
                "--max-connections must be greater than zero",
            ));
        }
        config = config.with_max_connections(max);
    }
    if let Some(secs) = args.acquire_timeout_secs {
        if secs == 0 {
            return Err(CliError::validation(
                "--acquire-timeout-secs must be greater than zero",
            ));
        }
        config = config.with_acquire_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

#[derive(Parser)]
#[command(
    name = "seclabel",
    about = "Manage PostgreSQL security labels declaratively"
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) connection: ConnectionArgs,
    #[arg(
        long,
        global = true,
        env = "SECLABEL_LOG",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log level or filter directive; RUST_LOG takes precedence"
    )]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "SECLABEL_LOG_FORMAT",
        value_parser = LogFormat::from_str,
        help = "Log format: pretty or json (defaults to pretty in debug builds, json otherwise)"
    )]
    pub(crate) log_format: Option<LogFormat>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Args)]
pub(crate) struct ConnectionArgs {
    #[arg(
        long,
        global = true,
        env = "SECLABEL_DATABASE_URL",
        hide_env_values = true,
        help = "PostgreSQL connection string (falls back to DATABASE_URL)"
    )]
    pub(crate) database_url: Option<String>,
    #[arg(long, global = true, env = "SECLABEL_MAX_CONNECTIONS")]
    pub(crate) max_connections: Option<u32>,
    #[arg(long, global = true, env = "SECLABEL_ACQUIRE_TIMEOUT_SECS")]
    pub(crate) acquire_timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the resource schema.
    Schema,
    /// Assign a label and record the resulting state.
    Create(CreateArgs),
    /// Refresh the state of a label by identity.
    Read(ReadArgs),
    /// Clear a label by identity.
    Delete(ReadArgs),
    /// Check whether an object carries a label.
    Exists(ExistsArgs),
    /// Import an existing label by identity.
    Import(ImportArgs),
    /// Compare two state files and report required replacements.
    Plan(PlanArgs),
}

#[derive(Args)]
pub(crate) struct CreateArgs {
    #[arg(long, help = "Label provider, for example anon")]
    pub(crate) label_provider: String,
    #[arg(long, help = "Label literal, for example 'MASKED', or NULL")]
    pub(crate) label: String,
    #[arg(long = "type", help = "Object type, for example ROLE or TABLE")]
    pub(crate) object_type: String,
    #[arg(long, help = "Object name, schema-qualified where the type allows")]
    pub(crate) name: String,
    #[arg(long, help = "Write the resulting state to this file")]
    pub(crate) state_out: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct ReadArgs {
    #[arg(help = "Resource identity, for example skynet or SCHEMA:audit")]
    pub(crate) id: String,
    #[arg(long, help = "Only consider labels from this provider")]
    pub(crate) label_provider: Option<String>,
}

#[derive(Args)]
pub(crate) struct ExistsArgs {
    #[arg(long = "type")]
    pub(crate) object_type: String,
    #[arg(long)]
    pub(crate) name: String,
}

#[derive(Args)]
pub(crate) struct ImportArgs {
    #[arg(help = "Resource identity, for example skynet or TABLE:public.customers")]
    pub(crate) id: String,
    #[arg(long, help = "Write the imported state to this file")]
    pub(crate) state_out: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct PlanArgs {
    #[arg(long, help = "State file recorded by a previous create, read, or import")]
    pub(crate) prior: PathBuf,
    #[arg(long, help = "State file holding the desired attributes")]
    pub(crate) proposed: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}
