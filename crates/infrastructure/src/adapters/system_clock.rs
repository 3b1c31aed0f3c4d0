//! System clock adapter

use chrono::{DateTime, Utc};
use warden_application::ports::Clock;

/// Clock reading the system time, used for token expiry checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let before = Utc::now();
        let now = SystemClock::new().now();
        assert!(now >= before);
        assert!(now <= Utc::now());
    }
}
