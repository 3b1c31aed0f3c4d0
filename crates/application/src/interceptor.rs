//! Bearer-token injection for outgoing data calls.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::trace;
use warden_domain::{Session, authorization_value};

use crate::ports::{AUTHORIZATION_HEADER, HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Attaches the current token to outgoing requests.
///
/// Reads the latest session snapshot without waiting, so a slow session
/// pipeline never blocks a request.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    session: watch::Receiver<Arc<Session>>,
}

impl RequestAuthenticator {
    /// Creates an authenticator over a session subscription.
    #[must_use]
    pub const fn new(session: watch::Receiver<Arc<Session>>) -> Self {
        Self { session }
    }

    /// Returns `request` with an `Authorization` header when a token is known.
    #[must_use]
    pub fn authenticate(&self, request: HttpRequest) -> HttpRequest {
        let token = self.session.borrow().token.clone();
        match token {
            Some(token) => {
                trace!(path = %request.path, "attaching bearer token");
                request.with_header(AUTHORIZATION_HEADER, authorization_value(&token))
            }
            None => request,
        }
    }
}

/// An [`HttpTransport`] that authenticates every request it sends.
///
/// A 401 on an ordinary data call is returned to the caller as-is; it never
/// ends the session.
#[derive(Debug, Clone)]
pub struct AuthenticatedTransport<T> {
    inner: T,
    authenticator: RequestAuthenticator,
}

impl<T: HttpTransport> AuthenticatedTransport<T> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: T, authenticator: RequestAuthenticator) -> Self {
        Self {
            inner,
            authenticator,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for AuthenticatedTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.inner.send(self.authenticator.authenticate(request)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::HttpMethod;
    use crate::testing::ScriptedTransport;
    use pretty_assertions::assert_eq;
    use warden_domain::{SessionEvent, User};

    fn signed_in(token: &str) -> Session {
        Session::new().apply(&SessionEvent::LoginSucceeded {
            user: User::new("demo"),
            token: token.to_string(),
        })
    }

    #[test]
    fn adds_header_only_when_token_present() {
        let (tx, rx) = watch::channel(Arc::new(Session::new()));
        let authenticator = RequestAuthenticator::new(rx);

        let anonymous = authenticator.authenticate(HttpRequest::get("cohorts"));
        assert_eq!(anonymous.header(AUTHORIZATION_HEADER), None);

        tx.send_replace(Arc::new(signed_in("abc.def.ghi")));
        let request = authenticator.authenticate(HttpRequest::get("cohorts"));
        assert_eq!(request.header("authorization"), Some("Bearer abc.def.ghi"));
    }

    #[test]
    fn replaces_existing_authorization_header() {
        let (_tx, rx) = watch::channel(Arc::new(signed_in("fresh")));
        let request = RequestAuthenticator::new(rx).authenticate(
            HttpRequest::get("cohorts").with_header("authorization", "Bearer stale"),
        );
        assert_eq!(request.header(AUTHORIZATION_HEADER), Some("Bearer fresh"));
        assert_eq!(request.headers.len(), 1);
    }

    #[tokio::test]
    async fn transport_decorator_authenticates_and_passes_401_through() {
        let (_tx, rx) = watch::channel(Arc::new(signed_in("t1")));
        let inner = Arc::new(ScriptedTransport::new());
        inner.respond(HttpMethod::Get, "cohorts", HttpResponse::new(401));
        let transport = AuthenticatedTransport::new(inner.clone(), RequestAuthenticator::new(rx));

        let response = transport.send(HttpRequest::get("cohorts")).await.unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(
            inner.requests()[0].header(AUTHORIZATION_HEADER),
            Some("Bearer t1")
        );
    }
}
