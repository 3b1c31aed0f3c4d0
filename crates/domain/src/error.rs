//! Domain error types

use thiserror::Error;

/// Domain-level errors raised while validating configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A settings value cannot be used.
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
