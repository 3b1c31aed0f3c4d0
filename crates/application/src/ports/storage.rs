//! Key-value storage port
//!
//! The durable home of the bearer token and the auth-client marker.

use thiserror::Error;

/// Errors raised while opening durable storage.
///
/// These are configuration errors: once a store is open, reads and writes
/// are treated as infallible by the session core.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but does not hold a JSON object of strings.
    #[error("corrupt storage file: {0}")]
    Corrupt(String),

    /// No location could be determined for the storage file.
    #[error("could not determine a data directory for session storage")]
    NoDataDir,
}

/// Synchronous string key-value storage that survives process restarts.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the raw stored value.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a value, replacing any previous one.
    fn set(&self, key: &str, value: &str);

    /// Removes a value. Removing a missing key is a no-op.
    fn remove(&self, key: &str);
}
