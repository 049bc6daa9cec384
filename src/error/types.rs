//! Error types for transaction audit logging.

use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Transaction lifecycle errors.
    #[error("Transaction error: {kind}")]
    Transaction { kind: TransactionErrorKind },

    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Logging backend errors (formatting, writing, hooks).
    #[error("Sink error: {message}")]
    Sink { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Transaction error kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionErrorKind {
    #[error("transaction '{id}' is already open")]
    Duplicate { id: String },

    #[error("transaction '{id}' not found")]
    NotFound { id: String },
}

impl AuditError {
    /// Build a duplicate-transaction error.
    pub fn duplicate(id: impl Into<String>) -> Self {
        AuditError::Transaction {
            kind: TransactionErrorKind::Duplicate { id: id.into() },
        }
    }

    /// Build a transaction-not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        AuditError::Transaction {
            kind: TransactionErrorKind::NotFound { id: id.into() },
        }
    }

    /// Whether this error reports an id that is already open.
    pub fn is_duplicate_transaction(&self) -> bool {
        matches!(
            self,
            AuditError::Transaction {
                kind: TransactionErrorKind::Duplicate { .. }
            }
        )
    }

    /// Whether this error reports an id that is not open.
    pub fn is_transaction_not_found(&self) -> bool {
        matches!(
            self,
            AuditError::Transaction {
                kind: TransactionErrorKind::NotFound { .. }
            }
        )
    }
}

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_error_messages() {
        let err = AuditError::duplicate("tx1");
        assert_eq!(
            err.to_string(),
            "Transaction error: transaction 'tx1' is already open"
        );

        let err = AuditError::not_found("tx2");
        assert_eq!(err.to_string(), "Transaction error: transaction 'tx2' not found");
    }

    #[test]
    fn test_predicates() {
        assert!(AuditError::duplicate("a").is_duplicate_transaction());
        assert!(!AuditError::duplicate("a").is_transaction_not_found());
        assert!(AuditError::not_found("a").is_transaction_not_found());

        let cfg = AuditError::Config {
            message: "bad".to_string(),
        };
        assert!(!cfg.is_duplicate_transaction());
        assert!(!cfg.is_transaction_not_found());
    }
}
