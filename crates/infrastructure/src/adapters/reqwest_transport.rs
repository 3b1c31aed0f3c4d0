//! HTTP transport implementation using reqwest.
//!
//! This adapter implements the `HttpTransport` port. Request paths are
//! resolved against the configured API base URL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tracing::debug;
use warden_application::ports::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError,
};

/// Timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP transport backed by `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url`.
    ///
    /// Default configuration:
    /// - Request timeout: 30 seconds
    /// - Follow redirects: up to 10
    /// - User-Agent: "Warden/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be
    /// created.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("Warden/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Self::with_client(client, base_url)
    }

    /// Creates a transport with a custom reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, TransportError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// The base URL paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Converts the port `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{e}: {path}")))
    }

    /// Maps reqwest errors to `TransportError`.
    fn map_error(error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout;
        }
        if error.is_connect() {
            let host = error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string();
            return TransportError::ConnectionFailed(format!("{host}: {error}"));
        }
        if error.is_builder() {
            return TransportError::InvalidUrl(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

/// Parses a base URL, making sure relative joins keep its last segment.
fn parse_base_url(base_url: &str) -> Result<Url, TransportError> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| TransportError::InvalidUrl(format!("{e}: {base_url}")))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self.resolve(&request.path)?;
        debug!(method = request.method.as_str(), %url, "sending request");

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(form) = &request.form {
            let body = serde_urlencoded::to_string(form)
                .map_err(|e| TransportError::Other(format!("Failed to encode form: {e}")))?;
            if request.header("content-type").is_none() {
                builder = builder.header("Content-Type", FORM_CONTENT_TYPE);
            }
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| Self::map_error(&e))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_ascii_lowercase(),
                    v.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
