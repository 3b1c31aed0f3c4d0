//! Authenticated user identity

use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// The identity and permission list of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name.
    pub login: String,
    /// Human-readable name, if the provider supplied one.
    pub display_name: Option<String>,
    /// Granted permissions, in the order the server returned them.
    pub permissions: Vec<Permission>,
}

impl User {
    /// Creates a user with no display name and no permissions.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            display_name: None,
            permissions: Vec::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Replaces the permission list.
    #[must_use]
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Name to show in the UI: the display name, falling back to the login.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.login)
    }
}

/// Wire shape of `GET user/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    /// Login name.
    pub login: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Permission grants.
    #[serde(default)]
    pub permissions: Vec<PermissionGrant>,
}

/// One entry of the `permissions` array returned by `user/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionGrant {
    /// The permission string.
    pub permission: String,
}

impl From<UserInfo> for User {
    fn from(info: UserInfo) -> Self {
        Self {
            login: info.login,
            display_name: info.name.filter(|name| !name.is_empty()),
            permissions: info
                .permissions
                .into_iter()
                .map(|grant| Permission::new(grant.permission))
                .collect(),
        }
    }
}
