//! Session snapshot and transition function.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionEvent;
use crate::auth::{User, is_expired_at, token_expiration};
use crate::permission::Permission;

/// Coarse lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No user is signed in.
    #[default]
    Anonymous,
    /// A login or bootstrap identity load is in progress.
    Authenticating,
    /// A user is signed in.
    Authenticated,
    /// A signed-in user's token is being refreshed.
    Refreshing,
}

/// One immutable snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    /// Lifecycle phase.
    pub phase: SessionPhase,
    /// Whether a user is signed in. Implies `user.is_some()`.
    pub authenticated: bool,
    /// The signed-in user.
    pub user: Option<User>,
    /// The current bearer token.
    pub token: Option<String>,
    /// Expiration read from `token`; `None` when unknown.
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Whether a session operation is in flight.
    pub loading: bool,
    /// Last user-visible error.
    pub last_error: Option<String>,
}

impl Session {
    /// Creates the empty, anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the snapshot that follows `event`.
    ///
    /// This never performs I/O. Events that only trigger side effects
    /// (`LogoutRequested`, `StoredAuthChecked`) return an unchanged copy.
    #[must_use]
    pub fn apply(&self, event: &SessionEvent) -> Self {
        let mut next = self.clone();
        match event {
            SessionEvent::LoginRequested => {
                next.phase = SessionPhase::Authenticating;
                next.loading = true;
                next.last_error = None;
            }
            SessionEvent::LoginSucceeded { user, token } => {
                next.phase = SessionPhase::Authenticated;
                next.authenticated = true;
                next.user = Some(user.clone());
                next.set_token(Some(token.clone()));
                next.loading = false;
                next.last_error = None;
            }
            SessionEvent::LoginFailed { error } => {
                next = Self {
                    last_error: Some(error.clone()),
                    ..Self::default()
                };
            }
            SessionEvent::UserInfoRequested => {
                if !next.authenticated {
                    next.phase = SessionPhase::Authenticating;
                }
                next.loading = true;
            }
            SessionEvent::UserInfoLoaded { user } => {
                next.phase = SessionPhase::Authenticated;
                next.authenticated = true;
                next.user = Some(user.clone());
                next.loading = false;
            }
            SessionEvent::UserInfoLoadFailed { error } => {
                next.phase = next.settled_phase();
                next.loading = false;
                next.last_error = Some(error.clone());
            }
            SessionEvent::TokenSet { token } | SessionEvent::RefreshSucceeded { token } => {
                next.set_token(Some(token.clone()));
                next.phase = next.settled_phase();
            }
            SessionEvent::RefreshRequested => {
                if next.authenticated {
                    next.phase = SessionPhase::Refreshing;
                }
            }
            SessionEvent::RefreshFailed { error } => {
                next.phase = next.settled_phase();
                next.last_error = Some(error.clone());
            }
            SessionEvent::LogoutCompleted => next = Self::default(),
            SessionEvent::LogoutRequested | SessionEvent::StoredAuthChecked => {}
        }
        next
    }

    /// Returns true if the token is missing, undecodable or past its expiry.
    #[must_use]
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token.is_none() || is_expired_at(self.token_expires_at, now)
    }

    /// Permissions of the signed-in user; empty when anonymous.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        self.user.as_ref().map_or(&[], |user| user.permissions.as_slice())
    }

    /// Login of the signed-in user.
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.login.as_str())
    }

    fn set_token(&mut self, token: Option<String>) {
        self.token_expires_at = token.as_deref().and_then(token_expiration);
        self.token = token;
    }

    /// Phase to settle on once a transient operation ends.
    const fn settled_phase(&self) -> SessionPhase {
        match self.phase {
            SessionPhase::Authenticating | SessionPhase::Refreshing if self.authenticated => {
                SessionPhase::Authenticated
            }
            SessionPhase::Authenticating => SessionPhase::Anonymous,
            phase => phase,
        }
    }
}
