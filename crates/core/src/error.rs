//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// invariants). Infrastructure concerns (storage, transport) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A departure asked for more stock than the ledger holds.
    ///
    /// This is a recoverable business condition, not a system fault; callers
    /// drop the offending event and carry on.
    #[error("insufficient stock: required {required}, available {available}")]
    InsufficientStock { required: i64, available: i64 },

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(required: i64, available: i64) -> Self {
        Self::InsufficientStock {
            required,
            available,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
