//! Session settings
//!
//! Deployment configuration for the session core. Every field has a
//! default so a partial `settings.json` is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::navigation::Route;

/// How a provider authenticates the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    /// Username and password posted as a form.
    #[default]
    Credentials,
    /// GET with transparent credentials (integrated Windows and the like).
    Ajax,
    /// Full-page navigation to the provider.
    Redirect,
}

/// One configured authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviderSettings {
    /// Identifier, stored as the auth-client marker after login.
    pub name: String,
    /// Path relative to the API base URL.
    pub path: String,
    /// Login mode.
    #[serde(default)]
    pub mode: LoginMode,
}

/// Settings for the session core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Base URL all API paths are resolved against.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Whether authentication is enforced. When false every permission
    /// check passes and guards allow everything.
    #[serde(default = "default_enforce_authentication")]
    pub enforce_authentication: bool,

    /// Route shown after a successful login.
    #[serde(default = "default_landing_route")]
    pub landing_route: String,

    /// Route of the login view.
    #[serde(default = "default_login_route")]
    pub login_route: String,

    /// Path of the current-user endpoint.
    #[serde(default = "default_user_info_path")]
    pub user_info_path: String,

    /// Path of the token refresh endpoint.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// File holding the persisted token. Platform data dir when unset.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Available authentication providers, first one is the default.
    #[serde(default = "default_providers")]
    pub providers: Vec<AuthProviderSettings>,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api/v1/".to_string()
}

const fn default_enforce_authentication() -> bool {
    true
}

fn default_landing_route() -> String {
    "/home".to_string()
}

fn default_login_route() -> String {
    "/auth/login".to_string()
}

fn default_user_info_path() -> String {
    "user/me".to_string()
}

fn default_refresh_path() -> String {
    "user/refresh".to_string()
}

fn default_providers() -> Vec<AuthProviderSettings> {
    vec![AuthProviderSettings {
        name: "db".to_string(),
        path: "auth/login/db".to_string(),
        mode: LoginMode::Credentials,
    }]
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            enforce_authentication: default_enforce_authentication(),
            landing_route: default_landing_route(),
            login_route: default_login_route(),
            user_info_path: default_user_info_path(),
            refresh_path: default_refresh_path(),
            storage_path: None,
            providers: default_providers(),
        }
    }
}

impl SessionSettings {
    /// Looks up a provider by name.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&AuthProviderSettings> {
        self.providers.iter().find(|provider| provider.name == name)
    }

    /// The first configured provider.
    #[must_use]
    pub fn default_provider(&self) -> Option<&AuthProviderSettings> {
        self.providers.first()
    }

    /// Route shown after login.
    #[must_use]
    pub fn landing(&self) -> Route {
        Route::new(&self.landing_route)
    }

    /// Route of the login view.
    #[must_use]
    pub fn login(&self) -> Route {
        Route::new(&self.login_route)
    }

    /// Checks the settings for values the session core cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSetting` naming the first offending field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(DomainError::InvalidSetting(
                "api_base_url must not be empty".to_string(),
            ));
        }
        for (field, route) in [
            ("landing_route", &self.landing_route),
            ("login_route", &self.login_route),
        ] {
            if !route.starts_with('/') {
                return Err(DomainError::InvalidSetting(format!(
                    "{field} must start with '/': {route}"
                )));
            }
        }
        for (index, provider) in self.providers.iter().enumerate() {
            if provider.name.is_empty() || provider.path.is_empty() {
                return Err(DomainError::InvalidSetting(format!(
                    "provider #{index} needs a name and a path"
                )));
            }
            if self.providers[..index]
                .iter()
                .any(|other| other.name == provider.name)
            {
                return Err(DomainError::InvalidSetting(format!(
                    "duplicate provider name: {}",
                    provider.name
                )));
            }
        }
        Ok(())
    }
}
