//! HTTP transport port
//!
//! The session core only needs a narrow slice of HTTP: GET and form POST
//! against paths relative to the API base URL, request headers, and the
//! response status, headers and body.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Header carrying credentials on outgoing requests.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// HTTP methods used by the session core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
}

impl HttpMethod {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Path relative to the API base URL.
    pub path: String,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Form fields, sent `application/x-www-form-urlencoded`.
    pub form: Option<Vec<(String, String)>>,
    /// Whether ambient credentials (cookies, integrated auth) should be sent.
    pub with_credentials: bool,
}

impl HttpRequest {
    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            headers: Vec::new(),
            form: None,
            with_credentials: false,
        }
    }

    /// Creates a form POST request.
    #[must_use]
    pub fn post_form<I, K, V>(path: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            headers: Vec::new(),
            form: Some(
                fields
                    .into_iter()
                    .map(|(name, value)| (name.into(), value.into()))
                    .collect(),
            ),
            with_credentials: false,
        }
    }

    /// Sets a header, replacing any existing header of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Requests that ambient credentials be sent.
    #[must_use]
    pub const fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }

    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A received response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Headers keyed by lower-cased name.
    pub headers: HashMap<String, String>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport-level failures. HTTP error statuses are not errors here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for sending HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no response was received.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_header_replaces_case_insensitively() {
        let request = HttpRequest::get("user/me")
            .with_header("authorization", "Bearer old")
            .with_header(AUTHORIZATION_HEADER, "Bearer new");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn post_form_collects_fields() {
        let request = HttpRequest::post_form("auth/login/db", [("login", "demo"), ("password", "x")]);
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.form,
            Some(vec![
                ("login".to_string(), "demo".to_string()),
                ("password".to_string(), "x".to_string()),
            ])
        );
        assert!(!request.with_credentials);
    }

    #[test]
    fn response_headers_are_case_insensitive() {
        let response = HttpResponse::new(200).with_header("Bearer", "abc");
        assert_eq!(response.header("bearer"), Some("abc"));
        assert_eq!(response.header("BEARER"), Some("abc"));
        assert!(response.is_success());
        assert!(!HttpResponse::new(401).is_success());
    }
}
