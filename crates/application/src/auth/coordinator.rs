//! Session coordinator: owner of the current session snapshot.
//!
//! The coordinator is the only place where [`SessionEvent`]s are applied.
//! Its public operations are the effects layer: they call the
//! [`SessionClient`], turn the outcome into events, and issue navigation.
//!
//! Guarantees:
//! - at most one login is in flight; a second request while one is pending
//!   is dropped, not queued;
//! - a failed refresh always ends in a full logout;
//! - a login or refresh result that completes after a logout issued during
//!   its flight is discarded, so the session stays anonymous;
//! - navigation is fire-and-forget and never feeds events back.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};
use warden_domain::{AuthProviderSettings, Route, Session, SessionEvent, SessionSettings};

use super::{LoginSuccess, SessionClient};
use crate::error::SessionResult;
use crate::ports::Navigator;

/// Result of a login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The user is signed in.
    Succeeded,
    /// The login failed; the message is also in `Session::last_error`.
    Failed(String),
    /// Another login was already in flight; nothing happened.
    Dropped,
    /// A logout happened while the login was in flight; its result was thrown away.
    Discarded,
}

/// Result of a refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new token is current.
    Refreshed,
    /// Authentication is not enforced; nothing to refresh.
    Skipped,
    /// The refresh failed and the session was logged out.
    LoggedOut(String),
    /// A logout happened while the refresh was in flight.
    Discarded,
}

/// Releases the in-flight login flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the session snapshot and runs the session lifecycle.
pub struct SessionCoordinator {
    client: SessionClient,
    navigator: Arc<dyn Navigator>,
    landing: Route,
    login: Route,
    state: watch::Sender<Arc<Session>>,
    login_in_flight: AtomicBool,
    logout_epoch: AtomicU64,
}

impl SessionCoordinator {
    /// Creates a coordinator with an empty, anonymous session.
    #[must_use]
    pub fn new(
        client: SessionClient,
        navigator: Arc<dyn Navigator>,
        settings: &SessionSettings,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(Session::new()));
        Self {
            client,
            navigator,
            landing: settings.landing(),
            login: settings.login(),
            state,
            login_in_flight: AtomicBool::new(false),
            logout_epoch: AtomicU64::new(0),
        }
    }

    /// The latest snapshot. Never waits.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Session> {
        self.state.borrow().clone()
    }

    /// A receiver observing every new snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Session>> {
        self.state.subscribe()
    }

    /// The underlying session client.
    #[must_use]
    pub const fn client(&self) -> &SessionClient {
        &self.client
    }

    /// Applies one event to the current snapshot.
    pub fn dispatch(&self, event: SessionEvent) {
        self.state.send_modify(|current| {
            let next = current.apply(&event);
            debug!(
                event = event.name(),
                from = ?current.phase,
                to = ?next.phase,
                "session transition"
            );
            *current = Arc::new(next);
        });
    }

    /// Decides the initial session from the persisted token.
    ///
    /// A non-expired token leads to a user-info load; anything else runs the
    /// logout cycle, which also discards an expired token.
    pub async fn bootstrap(&self) -> Arc<Session> {
        self.dispatch(SessionEvent::StoredAuthChecked);
        let stored = self.client.tokens().token();
        match stored {
            Some(token) if !self.client.is_token_expired() => {
                debug!("restoring session from stored token");
                self.dispatch(SessionEvent::TokenSet { token });
                if let Err(error) = self.load_user_info().await {
                    debug!(code = error.code(), "restored session has no user info");
                }
            }
            Some(_) => {
                info!("stored token expired or unreadable, starting anonymous");
                self.logout();
            }
            None => self.logout(),
        }
        self.snapshot()
    }

    /// Logs in with a username and password through `provider`.
    pub async fn login_with_credentials(
        &self,
        provider: &AuthProviderSettings,
        username: &str,
        password: &str,
    ) -> LoginOutcome {
        self.run_login(
            provider,
            self.client
                .login_with_credentials(&provider.path, username, password),
        )
        .await
    }

    /// Logs in with transparent credentials through `provider`.
    pub async fn login_via_ajax(&self, provider: &AuthProviderSettings) -> LoginOutcome {
        self.run_login(provider, self.client.login_via_ajax(&provider.path))
            .await
    }

    /// Sends the user to a redirect-based provider.
    ///
    /// No session event is produced; the session is restored by
    /// [`bootstrap`](Self::bootstrap) after the provider sends the user back.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider URL cannot be built.
    pub fn login_via_redirect(&self, provider: &AuthProviderSettings) -> SessionResult<()> {
        let url = self.client.login_via_redirect(&provider.path)?;
        self.client.tokens().set_auth_client(Some(&provider.name));
        info!(provider = %provider.name, "redirecting to login provider");
        self.navigator.redirect(&url);
        Ok(())
    }

    /// Reloads the user's identity in the background.
    ///
    /// A failure is recorded in `last_error` but never signs the user out.
    ///
    /// # Errors
    ///
    /// Returns the failure that was recorded.
    pub async fn load_user_info(&self) -> SessionResult<()> {
        self.dispatch(SessionEvent::UserInfoRequested);
        match self.client.load_user_info().await {
            Ok(user) => {
                self.dispatch(SessionEvent::UserInfoLoaded { user });
                Ok(())
            }
            Err(error) => {
                warn!(%error, "user info load failed");
                self.dispatch(SessionEvent::UserInfoLoadFailed {
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Refreshes the token; any failure logs the session out.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.client.enforcement().is_enforced() {
            return RefreshOutcome::Skipped;
        }
        let epoch = self.logout_epoch.load(Ordering::Acquire);
        self.dispatch(SessionEvent::RefreshRequested);
        let result = self.client.refresh_token().await;

        // Storage may already belong to a newer session.
        if self.logout_epoch.load(Ordering::Acquire) != epoch {
            warn!("logout during refresh, discarding result");
            return RefreshOutcome::Discarded;
        }

        match result {
            Ok(Some(token)) => {
                self.client.tokens().set_token(Some(&token));
                self.dispatch(SessionEvent::RefreshSucceeded { token });
                RefreshOutcome::Refreshed
            }
            Ok(None) => RefreshOutcome::Skipped,
            Err(error) => {
                let message = error.to_string();
                warn!(%error, "token refresh failed, logging out");
                self.dispatch(SessionEvent::RefreshFailed {
                    error: message.clone(),
                });
                self.logout();
                RefreshOutcome::LoggedOut(message)
            }
        }
    }

    /// Whether the current user holds `requested`, answered through the
    /// client's permission cache.
    #[must_use]
    pub fn is_permitted(&self, requested: &str) -> bool {
        self.client
            .permissions()
            .is_permitted(requested, self.snapshot().permissions())
    }

    /// Ends the session: clears storage, resets the snapshot, shows login.
    ///
    /// Calling it repeatedly is harmless.
    pub fn logout(&self) {
        self.logout_epoch.fetch_add(1, Ordering::AcqRel);
        self.dispatch(SessionEvent::LogoutRequested);
        self.client.logout();
        self.dispatch(SessionEvent::LogoutCompleted);
        self.navigator.navigate(&self.login);
    }

    async fn run_login<F>(&self, provider: &AuthProviderSettings, attempt: F) -> LoginOutcome
    where
        F: Future<Output = SessionResult<LoginSuccess>>,
    {
        let Some(_in_flight) = InFlight::acquire(&self.login_in_flight) else {
            warn!(provider = %provider.name, "login already in progress, dropping request");
            return LoginOutcome::Dropped;
        };
        let epoch = self.logout_epoch.load(Ordering::Acquire);
        self.dispatch(SessionEvent::LoginRequested);

        let result = attempt.await;

        if self.logout_epoch.load(Ordering::Acquire) != epoch {
            warn!(provider = %provider.name, "logout during login, discarding result");
            if result.is_ok() {
                self.client.tokens().set_token(None);
            }
            return LoginOutcome::Discarded;
        }

        match result {
            Ok(LoginSuccess { user, token }) => {
                self.client.tokens().set_auth_client(Some(&provider.name));
                info!(login = %user.login, provider = %provider.name, "login succeeded");
                self.dispatch(SessionEvent::LoginSucceeded { user, token });
                self.navigator.navigate(&self.landing);
                LoginOutcome::Succeeded
            }
            Err(error) => {
                let message = error.login_failure_message();
                warn!(provider = %provider.name, code = error.code(), "login failed: {message}");
                self.dispatch(SessionEvent::LoginFailed {
                    error: message.clone(),
                });
                LoginOutcome::Failed(message)
            }
        }
    }
}
