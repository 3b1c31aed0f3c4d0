//! Clock port for token expiry checks

use chrono::{DateTime, Utc};

/// Port for getting the current time.
///
/// Expiry decisions go through this port so tests can pin "now".
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
