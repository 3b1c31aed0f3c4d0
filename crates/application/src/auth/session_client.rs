//! Session client: the network side of logging in and out.
//!
//! Each operation talks to the provider through the [`HttpTransport`] port,
//! keeps the [`TokenStore`] up to date and returns a typed outcome. It never
//! touches the session snapshot; the coordinator turns outcomes into events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;
use warden_domain::{
    BEARER_HEADER, SessionSettings, User, UserInfo, authorization_value, is_expired_at,
    token_expiration,
};

use super::TokenStore;
use crate::error::{SessionError, SessionResult};
use crate::permissions::{AuthEnforcement, PermissionCache};
use crate::ports::{
    AUTHORIZATION_HEADER, Clock, HttpRequest, HttpResponse, HttpTransport, TransportError,
};

/// Form field carrying the username.
pub const LOGIN_FIELD: &str = "login";

/// Form field carrying the password.
pub const PASSWORD_FIELD: &str = "password";

/// Static configuration of a [`SessionClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClientConfig {
    /// Base URL used to build redirect-login targets.
    pub api_base_url: String,
    /// Path of the current-user endpoint.
    pub user_info_path: String,
    /// Path of the refresh endpoint.
    pub refresh_path: String,
    /// Whether authentication is enforced.
    pub enforcement: AuthEnforcement,
}

impl From<&SessionSettings> for SessionClientConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            api_base_url: settings.api_base_url.clone(),
            user_info_path: settings.user_info_path.clone(),
            refresh_path: settings.refresh_path.clone(),
            enforcement: AuthEnforcement::from_flag(settings.enforce_authentication),
        }
    }
}

impl Default for SessionClientConfig {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

/// Token and identity produced by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    /// The signed-in user.
    pub user: User,
    /// The acquired token, already persisted.
    pub token: String,
}

/// Performs login, refresh, user-info and logout against the provider.
pub struct SessionClient {
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    permissions: Arc<PermissionCache>,
    clock: Arc<dyn Clock>,
    config: SessionClientConfig,
}

impl SessionClient {
    /// Creates a session client.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: TokenStore,
        permissions: Arc<PermissionCache>,
        clock: Arc<dyn Clock>,
        config: SessionClientConfig,
    ) -> Self {
        Self {
            transport,
            tokens,
            permissions,
            clock,
            config,
        }
    }

    /// The token store this client writes to.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The permission cache cleared on logout.
    #[must_use]
    pub const fn permissions(&self) -> &Arc<PermissionCache> {
        &self.permissions
    }

    /// Whether authentication is enforced.
    #[must_use]
    pub const fn enforcement(&self) -> AuthEnforcement {
        self.config.enforcement
    }

    /// Logs in by posting form-encoded credentials to `provider_path`.
    ///
    /// # Errors
    ///
    /// `CredentialsRequired` before any I/O when either value is blank;
    /// otherwise whatever the token request or the user-info load failed with.
    pub async fn login_with_credentials(
        &self,
        provider_path: &str,
        username: &str,
        password: &str,
    ) -> SessionResult<LoginSuccess> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SessionError::CredentialsRequired);
        }
        let request = HttpRequest::post_form(
            provider_path,
            [(LOGIN_FIELD, username), (PASSWORD_FIELD, password)],
        );
        self.login(request).await
    }

    /// Logs in with transparent credentials via `GET provider_path`.
    ///
    /// # Errors
    ///
    /// Whatever the token request or the user-info load failed with.
    pub async fn login_via_ajax(&self, provider_path: &str) -> SessionResult<LoginSuccess> {
        self.login(HttpRequest::get(provider_path).with_credentials())
            .await
    }

    /// Builds the URL of a redirect-based provider.
    ///
    /// The session is established later, when the application reloads with
    /// the token the provider stored.
    ///
    /// # Errors
    ///
    /// Returns a transport `InvalidUrl` error when the URL cannot be built.
    pub fn login_via_redirect(&self, provider_path: &str) -> SessionResult<String> {
        let mut base = self.config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let provider_path = provider_path.trim_start_matches('/');
        let url = Url::parse(&base)
            .and_then(|base| base.join(provider_path))
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {base}{provider_path}")))?;
        Ok(url.into())
    }

    /// Loads the current user with the stored token.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` on HTTP 401; other failures are passed through.
    pub async fn load_user_info(&self) -> SessionResult<User> {
        let request = self.with_stored_token(HttpRequest::get(&self.config.user_info_path));
        let response = self.transport.send(request).await?;
        if response.status == 401 {
            return Err(SessionError::NotAuthenticated);
        }
        if !response.is_success() {
            return Err(rejection(&response));
        }
        let info: UserInfo = serde_json::from_slice(&response.body)
            .map_err(|e| SessionError::InvalidResponse(e.to_string()))?;
        Ok(User::from(info))
    }

    /// Exchanges the stored token for a new one.
    ///
    /// Returns `Ok(None)` without any I/O when authentication is disabled.
    /// The new token is not persisted; the caller stores it once the result
    /// is known to still apply.
    ///
    /// # Errors
    ///
    /// Any failure; the caller is expected to end the session.
    pub async fn refresh_token(&self) -> SessionResult<Option<String>> {
        if !self.config.enforcement.is_enforced() {
            return Ok(None);
        }
        if self.tokens.token().is_none() {
            return Err(SessionError::NotAuthenticated);
        }
        let request = self.with_stored_token(HttpRequest::get(&self.config.refresh_path));
        let response = self.transport.send(request).await?;
        if response.status == 401 {
            return Err(SessionError::NotAuthenticated);
        }
        let token = bearer_token(&response)?;
        debug!("token refreshed");
        Ok(Some(token))
    }

    /// Forgets the persisted token, auth-client marker and cached permissions.
    pub fn logout(&self) {
        self.tokens.clear();
        self.permissions.clear();
        info!("session credentials cleared");
    }

    /// Expiration of the stored token, if it can be read.
    #[must_use]
    pub fn token_expiration(&self) -> Option<DateTime<Utc>> {
        self.tokens.token().as_deref().and_then(token_expiration)
    }

    /// True when the stored token is missing, unreadable or expired.
    #[must_use]
    pub fn is_token_expired(&self) -> bool {
        is_expired_at(self.token_expiration(), self.clock.now())
    }

    async fn login(&self, request: HttpRequest) -> SessionResult<LoginSuccess> {
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        let token = bearer_token(&response)?;
        self.tokens.set_token(Some(&token));
        debug!(provider = %path, "token acquired");

        match self.load_user_info().await {
            Ok(user) => Ok(LoginSuccess { user, token }),
            Err(error) => {
                self.tokens.set_token(None);
                Err(error)
            }
        }
    }

    fn with_stored_token(&self, request: HttpRequest) -> HttpRequest {
        match self.tokens.token() {
            Some(token) => request.with_header(AUTHORIZATION_HEADER, authorization_value(&token)),
            None => request,
        }
    }
}

/// The token carried by a successful response.
fn bearer_token(response: &HttpResponse) -> SessionResult<String> {
    if !response.is_success() {
        return Err(rejection(response));
    }
    response
        .header(BEARER_HEADER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(SessionError::MissingBearerHeader)
}

/// Builds a `Rejected` error, pulling a message out of the body when possible.
fn rejection(response: &HttpResponse) -> SessionError {
    SessionError::Rejected {
        status: response.status,
        message: server_message(response),
    }
}

fn server_message(response: &HttpResponse) -> Option<String> {
    if let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(&response.body) {
        return ["message", "error"]
            .iter()
            .find_map(|field| body.get(*field).and_then(Value::as_str))
            .filter(|message| !message.trim().is_empty())
            .map(str::to_string);
    }
    let text = response.text();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
