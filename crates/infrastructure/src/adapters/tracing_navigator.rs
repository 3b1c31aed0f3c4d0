//! Navigator for headless hosts.

use parking_lot::Mutex;
use tracing::info;
use warden_application::ports::Navigator;
use warden_domain::Route;

/// Navigator that logs every navigation and remembers where the user is.
///
/// Used where no view layer exists, such as the command-line binary.
#[derive(Debug, Default)]
pub struct TracingNavigator {
    current: Mutex<Option<String>>,
}

impl TracingNavigator {
    /// Creates a navigator with no current location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last route or URL navigated to.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.current.lock().clone()
    }
}

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &Route) {
        let location = route.to_string();
        info!(route = %location, "navigate");
        *self.current.lock() = Some(location);
    }

    fn redirect(&self, url: &str) {
        info!(%url, "redirect");
        *self.current.lock() = Some(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_last_location() {
        let navigator = TracingNavigator::new();
        assert_eq!(navigator.current(), None);

        navigator.navigate(&Route::login_returning_to("/auth/login", "/cohorts"));
        assert_eq!(
            navigator.current().as_deref(),
            Some("/auth/login?returnUrl=/cohorts")
        );

        navigator.redirect("https://idp.example.org/login");
        assert_eq!(
            navigator.current().as_deref(),
            Some("https://idp.example.org/login")
        );
    }
}
