//! Durable bearer-token storage.
//!
//! Wraps a [`KeyValueStorage`] with the two well-known entries the session
//! core persists, normalizing the sentinel values older clients wrote.

use std::fmt;
use std::sync::Arc;

use crate::ports::KeyValueStorage;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "bearerToken";

/// Storage key of the auth-client marker.
pub const AUTH_CLIENT_KEY: &str = "authClient";

/// Process-wide token storage.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    /// Creates a token store over the given storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Returns the persisted bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    /// Persists the bearer token; `None` removes it.
    pub fn set_token(&self, token: Option<&str>) {
        self.write(TOKEN_KEY, token);
    }

    /// Returns the auth-client marker.
    #[must_use]
    pub fn auth_client(&self) -> Option<String> {
        self.read(AUTH_CLIENT_KEY)
    }

    /// Persists the auth-client marker; `None` removes it.
    pub fn set_auth_client(&self, client: Option<&str>) {
        self.write(AUTH_CLIENT_KEY, client);
    }

    /// Removes both entries.
    pub fn clear(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(AUTH_CLIENT_KEY);
    }

    fn read(&self, key: &str) -> Option<String> {
        self.storage.get(key).filter(|value| !is_absent(value))
    }

    fn write(&self, key: &str, value: Option<&str>) {
        match value.filter(|value| !is_absent(value)) {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        }
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.token().is_some())
            .finish_non_exhaustive()
    }
}

/// Values that mean "nothing stored".
fn is_absent(value: &str) -> bool {
    value.is_empty() || value == "null" || value == "undefined"
}
