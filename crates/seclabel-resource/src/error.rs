//! Error types for resource lifecycle operations.

use seclabel_data::DataError;
use thiserror::Error;

/// Primary error type for the security label resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A required attribute was absent from resource data.
    #[error("missing required attribute '{attribute}'")]
    MissingAttribute {
        /// Attribute name.
        attribute: &'static str,
    },
    /// An attribute was present but could not be parsed.
    #[error("invalid value for attribute '{attribute}'")]
    InvalidAttribute {
        /// Attribute name.
        attribute: &'static str,
        /// Parsing failure.
        source: DataError,
    },
    /// The resource identity could not be parsed.
    #[error("invalid security label identity '{value}'")]
    InvalidIdentity {
        /// Identity as recorded in state.
        value: String,
        /// Parsing failure.
        source: DataError,
    },
    /// A label was written but could not be read back.
    #[error("security label on {object} not found after create")]
    NotFoundAfterCreate {
        /// Object that was labelled, in `KIND name` form.
        object: String,
    },
    /// The label store failed.
    #[error("security label store operation '{operation}' failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source data-layer error.
        source: DataError,
    },
    /// A required environment variable was not set.
    #[error("environment variable {name} is not set")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// An environment variable could not be parsed.
    #[error("environment variable {name} has invalid value '{value}': {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Value found in the environment.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// The connection pool could not be established.
    #[error("failed to connect to PostgreSQL")]
    Connect {
        /// Source database error.
        source: sqlx::Error,
    },
}

/// Convenience alias for resource results.
pub type ResourceResult<T> = Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn attribute_errors_name_the_attribute() {
        let missing = ResourceError::MissingAttribute { attribute: "label" };
        assert_eq!(missing.to_string(), "missing required attribute 'label'");

        let invalid = ResourceError::InvalidAttribute {
            attribute: "type",
            source: DataError::InvalidObjectType {
                value: "WIDGET".into(),
            },
        };
        assert_eq!(invalid.to_string(), "invalid value for attribute 'type'");
        assert!(invalid.source().is_some());
    }

    #[test]
    fn not_found_after_create_names_the_object() {
        let err = ResourceError::NotFoundAfterCreate {
            object: "ROLE skynet".into(),
        };
        assert_eq!(
            err.to_string(),
            "security label on ROLE skynet not found after create"
        );
    }

    #[test]
    fn env_errors_render_variable_names() {
        let missing = ResourceError::MissingEnv {
            name: "DATABASE_URL",
        };
        assert_eq!(missing.to_string(), "environment variable DATABASE_URL is not set");

        let invalid = ResourceError::InvalidEnv {
            name: "SECLABEL_MAX_CONNECTIONS",
            value: "many".into(),
            reason: "expected a positive integer",
        };
        assert!(invalid.to_string().contains("'many'"));
    }
}
