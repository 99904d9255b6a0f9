//! Shared error type and connected command context.

use std::fmt::{self, Display, Formatter};

use seclabel_resource::{PgLabelStore, ProviderConfig, ResourceError, SecurityLabelResource};

use crate::cli::OutputFormat;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ResourceError> for CliError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::MissingAttribute { .. }
            | ResourceError::InvalidAttribute { .. }
            | ResourceError::InvalidIdentity { .. }
            | ResourceError::MissingEnv { .. }
            | ResourceError::InvalidEnv { .. } => Self::Validation(format!(
                "{:#}",
                anyhow::Error::from(err)
            )),
            ResourceError::NotFoundAfterCreate { .. }
            | ResourceError::Store { .. }
            | ResourceError::Connect { .. } => Self::Failure(err.into()),
        }
    }
}

/// Handler and output settings shared by commands that reach the database.
pub(crate) struct AppContext {
    pub(crate) resource: SecurityLabelResource<PgLabelStore>,
    pub(crate) output: OutputFormat,
}

impl AppContext {
    pub(crate) async fn connect(config: &ProviderConfig, output: OutputFormat) -> CliResult<Self> {
        let resource = config.connect_resource().await?;
        Ok(Self { resource, output })
    }
}
