//! Error types for the data access layer.

use thiserror::Error;

use crate::statement::StatementAction;

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised by the data access layer.
#[derive(Debug, Error)]
pub enum DataError {
    /// An identifier could not be parsed or quoted.
    #[error("invalid {field} identifier '{value}': {reason}")]
    InvalidIdentifier {
        /// Attribute the identifier was supplied for.
        field: &'static str,
        /// Offending input.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A label value was not `NULL`, bare text, or a well-formed literal.
    #[error("invalid label literal '{value}': {reason}")]
    InvalidLabel {
        /// Offending input.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The object type keyword is not recognised.
    #[error("unknown object type '{value}'")]
    InvalidObjectType {
        /// Object type supplied by the caller.
        value: String,
    },
    /// The object type is a valid `SECURITY LABEL` target that is not managed here.
    #[error("security labels on {kind} objects are not supported")]
    UnsupportedObjectType {
        /// Normalised object type keyword.
        kind: String,
    },
    /// A schema-qualified name was supplied for an object kind without schemas.
    #[error("{kind} names cannot be schema-qualified: '{value}'")]
    QualifiedNameNotAllowed {
        /// Object type keyword.
        kind: &'static str,
        /// Offending input.
        value: String,
    },
    /// Executing a `SECURITY LABEL` statement failed.
    #[error("error {action} security label on {object_type} {object_name}")]
    StatementFailed {
        /// Whether the statement assigned or cleared the label.
        action: StatementAction,
        /// Object type keyword.
        object_type: &'static str,
        /// Rendered object name.
        object_name: String,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// Beginning, committing, or rolling back a transaction failed.
    #[error("transaction {operation} failed")]
    TransactionFailed {
        /// Transaction step identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// A catalog query failed.
    #[error("database operation '{operation}' failed")]
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn statement_failure_names_action_and_object() {
        let err = DataError::StatementFailed {
            action: StatementAction::Assign,
            object_type: "ROLE",
            object_name: "skynet".to_string(),
            source: sqlx::Error::RowNotFound,
        };
        assert_eq!(
            err.to_string(),
            "error creating security label on ROLE skynet"
        );
        assert!(err.source().is_some());

        let err = DataError::StatementFailed {
            action: StatementAction::Clear,
            object_type: "SCHEMA",
            object_name: "audit".to_string(),
            source: sqlx::Error::RowNotFound,
        };
        assert_eq!(
            err.to_string(),
            "error deleting security label on SCHEMA audit"
        );
    }

    #[test]
    fn data_error_display_and_source() {
        let query = DataError::QueryFailed {
            operation: "fetch security label",
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(
            query.to_string(),
            "database operation 'fetch security label' failed"
        );
        assert!(query.source().is_some());

        let tx = DataError::TransactionFailed {
            operation: "commit",
            source: sqlx::Error::PoolClosed,
        };
        assert_eq!(tx.to_string(), "transaction commit failed");
        assert!(tx.source().is_some());

        let unsupported = DataError::UnsupportedObjectType {
            kind: "FUNCTION".to_string(),
        };
        assert_eq!(
            unsupported.to_string(),
            "security labels on FUNCTION objects are not supported"
        );
        assert!(unsupported.source().is_none());
    }
}
