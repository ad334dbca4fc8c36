//! Error taxonomy for artwork reconciliation.

use thiserror::Error;

/// Errors raised while reconciling PMF artwork links.
///
/// Action-execution errors are converted into per-item outcomes by the
/// engine; only classification and configuration errors stop an item before
/// an action is chosen.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// A document version identifier did not match `<id>_<major>_<minor>`.
    #[error("Malformed document version identifier: '{input}'")]
    MalformedIdentifier {
        /// The rejected identifier.
        input: String,
    },

    /// An artwork field definition could not be parsed.
    #[error("Invalid artwork field definition '{entry}': {reason}")]
    InvalidFieldSpec {
        /// The offending definition entry.
        entry: String,
        /// Why the entry was rejected.
        reason: String,
    },

    /// The snapshot version is no longer the steady-state head version.
    #[error("Artwork version {version_id} has already advanced past the PMF snapshot")]
    StaleSnapshot {
        /// The snapshot version recorded on the artwork link.
        version_id: String,
    },

    /// A field marked `required` was empty on the approved version.
    #[error("Artwork version {version_id} is missing required field {field}")]
    MissingRequiredField {
        /// The empty field.
        field: String,
        /// The version the field was read from.
        version_id: String,
    },

    /// The vault rejected a create or update.
    #[error("{operation} rejected by the vault: {message}")]
    StoreWriteRejected {
        /// The write that was attempted.
        operation: String,
        /// The vault's message, verbatim.
        message: String,
    },

    /// A read needed to decide what to do failed.
    #[error("Query failed while {context}: {message}")]
    Query {
        /// What the query was for.
        context: String,
        /// The vault's message.
        message: String,
    },

    /// A row the engine depends on does not exist.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing row.
        what: String,
    },

    /// The run configuration is invalid.
    #[error("Invalid configuration: {message}")]
    Config {
        /// What is wrong with the configuration.
        message: String,
    },
}

impl ReconcileError {
    /// Builds a [`ReconcileError::Query`] from a port error.
    pub fn query(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Query { context: context.into(), message: err.to_string() }
    }

    /// Builds a [`ReconcileError::StoreWriteRejected`] from a port error.
    pub fn rejected(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::StoreWriteRejected { operation: operation.into(), message: err.to_string() }
    }

    /// Whether the error is caused by end-user state rather than by
    /// configuration or infrastructure.
    #[must_use]
    pub fn is_user_caused(&self) -> bool {
        matches!(
            self,
            Self::StaleSnapshot { .. }
                | Self::MissingRequiredField { .. }
                | Self::StoreWriteRejected { .. }
        )
    }
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_messages_are_kept_verbatim() {
        let err = ReconcileError::rejected("create version", "INVALID_DATA: bad barcode");
        assert_eq!(
            err.to_string(),
            "create version rejected by the vault: INVALID_DATA: bad barcode"
        );
        assert!(err.is_user_caused());
    }

    #[test]
    fn query_errors_are_not_user_caused() {
        let err = ReconcileError::query("reading head version", "timeout");
        assert!(!err.is_user_caused());
        assert!(err.to_string().contains("reading head version"));
    }
}
