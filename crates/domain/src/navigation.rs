//! Navigation targets produced by the session core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Query parameter carrying the originally requested path to the login view.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// An in-application navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route path, for example `/home`.
    pub path: String,
    /// Query parameters in insertion order.
    #[serde(default)]
    pub query: Vec<(String, String)>,
}

impl Route {
    /// Creates a route without query parameters.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Login route remembering where the user wanted to go.
    #[must_use]
    pub fn login_returning_to(login_path: impl Into<String>, return_to: impl Into<String>) -> Self {
        Self::new(login_path).with_query(RETURN_URL_PARAM, return_to)
    }

    /// Value of a query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (index, (name, value)) in self.query.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(f, "{separator}{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_route_carries_return_url() {
        let route = Route::login_returning_to("/login", "/cohorts/42");
        assert_eq!(route.path, "/login");
        assert_eq!(route.query_param(RETURN_URL_PARAM), Some("/cohorts/42"));
        assert_eq!(route.to_string(), "/login?returnUrl=/cohorts/42");
    }

    #[test]
    fn plain_route_has_no_query() {
        let route = Route::new("/home");
        assert!(route.query.is_empty());
        assert_eq!(route.to_string(), "/home");
        assert_eq!(route.query_param(RETURN_URL_PARAM), None);
    }
}
