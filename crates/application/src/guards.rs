//! Route guards.
//!
//! Each guard reads the latest session snapshot, decides whether a
//! navigation may proceed and, when it may not, issues the redirect itself.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use warden_domain::{Route, Session, SessionSettings};

use crate::permissions::PermissionCache;
use crate::ports::Navigator;

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The navigation may proceed.
    Allow,
    /// The navigation was replaced by this one.
    Redirect(Route),
}

impl GuardDecision {
    /// Returns true for [`GuardDecision::Allow`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// State shared by every guard.
#[derive(Clone)]
pub struct GuardContext {
    session: watch::Receiver<Arc<Session>>,
    permissions: Arc<PermissionCache>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    login_path: String,
}

impl GuardContext {
    /// Creates a guard context.
    ///
    /// `permissions` should be the cache owned by the session client, so
    /// that logout drops its answers.
    #[must_use]
    pub fn new(
        session: watch::Receiver<Arc<Session>>,
        permissions: Arc<PermissionCache>,
        navigator: Arc<dyn Navigator>,
        settings: &SessionSettings,
    ) -> Self {
        Self {
            session,
            permissions,
            navigator,
            landing_path: settings.landing_route.clone(),
            login_path: settings.login_route.clone(),
        }
    }

    fn snapshot(&self) -> Arc<Session> {
        self.session.borrow().clone()
    }

    fn enforced(&self) -> bool {
        self.permissions.policy().enforcement().is_enforced()
    }

    fn redirect(&self, route: Route) -> GuardDecision {
        debug!(to = %route, "guard redirect");
        self.navigator.navigate(&route);
        GuardDecision::Redirect(route)
    }

    fn to_login(&self, requested: &str) -> GuardDecision {
        self.redirect(Route::login_returning_to(&self.login_path, requested))
    }
}

/// Requires a signed-in user.
#[derive(Clone)]
pub struct AuthGuard {
    context: GuardContext,
}

impl AuthGuard {
    /// Creates the guard.
    #[must_use]
    pub const fn new(context: GuardContext) -> Self {
        Self { context }
    }

    /// Checks navigation to `path`.
    ///
    /// Anonymous users are sent to login with `path` as the return target.
    pub fn check(&self, path: &str) -> GuardDecision {
        if !self.context.enforced() || self.context.snapshot().authenticated {
            return GuardDecision::Allow;
        }
        self.context.to_login(path)
    }
}

/// Requires a signed-in user holding a permission.
#[derive(Clone)]
pub struct PermissionGuard {
    context: GuardContext,
}

impl PermissionGuard {
    /// Creates the guard.
    #[must_use]
    pub const fn new(context: GuardContext) -> Self {
        Self { context }
    }

    /// Checks navigation to `path`, which requires `permission`.
    ///
    /// Anonymous users go to login; users lacking the permission go to the
    /// landing route.
    pub fn check(&self, path: &str, permission: &str) -> GuardDecision {
        if !self.context.enforced() {
            return GuardDecision::Allow;
        }
        let session = self.context.snapshot();
        if !session.authenticated {
            return self.context.to_login(path);
        }
        if self.context.permissions.is_permitted(permission, session.permissions()) {
            GuardDecision::Allow
        } else {
            debug!(path, permission, "permission denied");
            self.context
                .redirect(Route::new(self.context.landing_path.clone()))
        }
    }
}

/// Keeps signed-in users off guest-only routes such as login.
#[derive(Clone)]
pub struct GuestGuard {
    context: GuardContext,
}

impl GuestGuard {
    /// Creates the guard.
    #[must_use]
    pub const fn new(context: GuardContext) -> Self {
        Self { context }
    }

    /// Checks navigation to a guest-only route.
    pub fn check(&self) -> GuardDecision {
        if self.context.snapshot().authenticated {
            self.context
                .redirect(Route::new(self.context.landing_path.clone()))
        } else {
            GuardDecision::Allow
        }
    }
}
