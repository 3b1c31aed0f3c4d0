//! Session lifecycle events

use crate::auth::User;

/// An event consumed by [`Session::apply`](super::Session::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login attempt started.
    LoginRequested,
    /// A login attempt produced a token and the user's identity.
    LoginSucceeded {
        /// The signed-in user.
        user: User,
        /// The acquired bearer token.
        token: String,
    },
    /// A login attempt failed.
    LoginFailed {
        /// Human-readable failure message.
        error: String,
    },
    /// A user-info load started.
    UserInfoRequested,
    /// The user's identity was loaded.
    UserInfoLoaded {
        /// The loaded user.
        user: User,
    },
    /// Loading the user's identity failed.
    UserInfoLoadFailed {
        /// Human-readable failure message.
        error: String,
    },
    /// A token became current without a login (for example at bootstrap).
    TokenSet {
        /// The token.
        token: String,
    },
    /// A token refresh started.
    RefreshRequested,
    /// A token refresh produced a new token.
    RefreshSucceeded {
        /// The new token.
        token: String,
    },
    /// A token refresh failed. Always followed by a logout.
    RefreshFailed {
        /// Human-readable failure message.
        error: String,
    },
    /// Logout was requested. The state itself is untouched.
    LogoutRequested,
    /// Logout finished; the session resets.
    LogoutCompleted,
    /// Stored credentials were inspected at bootstrap.
    StoredAuthChecked,
}

impl SessionEvent {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoginRequested => "login_requested",
            Self::LoginSucceeded { .. } => "login_succeeded",
            Self::LoginFailed { .. } => "login_failed",
            Self::UserInfoRequested => "user_info_requested",
            Self::UserInfoLoaded { .. } => "user_info_loaded",
            Self::UserInfoLoadFailed { .. } => "user_info_load_failed",
            Self::TokenSet { .. } => "token_set",
            Self::RefreshRequested => "refresh_requested",
            Self::RefreshSucceeded { .. } => "refresh_succeeded",
            Self::RefreshFailed { .. } => "refresh_failed",
            Self::LogoutRequested => "logout_requested",
            Self::LogoutCompleted => "logout_completed",
            Self::StoredAuthChecked => "stored_auth_checked",
        }
    }
}
