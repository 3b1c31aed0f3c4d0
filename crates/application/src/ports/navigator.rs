//! Navigation port

use warden_domain::Route;

/// Port through which the session core moves the user around.
///
/// Calls are fire-and-forget: implementations must not block and must not
/// feed anything back into the session.
pub trait Navigator: Send + Sync {
    /// Navigates to an in-application route.
    fn navigate(&self, route: &Route);

    /// Performs a full-page navigation to an external URL.
    fn redirect(&self, url: &str);
}
