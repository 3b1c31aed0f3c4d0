//! End-to-end session scenarios
//!
//! These tests wire the real adapters (reqwest transport, file storage)
//! to the session coordinator and run them against an in-process
//! authentication server.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use warden_application::ports::{HttpRequest, HttpTransport, KeyValueStorage};
use warden_application::testing::{Navigation, RecordingNavigator};
use warden_application::{
    AuthGuard, AuthenticatedTransport, GuardContext, GuardDecision, LoginOutcome,
    PermissionCache, PermissionGuard, PermissionPolicy, RefreshOutcome, RequestAuthenticator,
    SessionClient, SessionClientConfig, SessionCoordinator, TokenStore,
};
use warden_domain::{RETURN_URL_PARAM, Route, Session, SessionSettings};
use warden_infrastructure::{FileKeyValueStorage, ReqwestTransport, SystemClock};

fn jwt(exp: i64) -> String {
    format!(
        "eyJhbGciOiJIUzI1NiJ9.{}.c2ln",
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"demo","exp":{exp}}}"#))
    )
}

fn far_future_token() -> String {
    jwt(4_102_444_800)
}

#[derive(Clone)]
struct Server {
    token: String,
    refresh_fails: Arc<AtomicBool>,
}

async fn login(
    State(server): State<Server>,
    Form(fields): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    if fields.get("login").map(String::as_str) == Some("demo")
        && fields.get("password").map(String::as_str) == Some("demo")
    {
        (StatusCode::OK, [("Bearer", server.token)], String::new())
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [("Content-Type", "application/json".to_string())],
            r#"{"message":"Invalid credentials"}"#.to_string(),
        )
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn me(State(server): State<Server>, headers: HeaderMap) -> impl IntoResponse {
    if bearer(&headers).as_deref() == Some(server.token.as_str()) {
        (
            StatusCode::OK,
            r#"{"login":"demo","name":"Demo User","permissions":[{"permission":"*:*:*"}]}"#
                .to_string(),
        )
    } else {
        (StatusCode::UNAUTHORIZED, String::new())
    }
}

async fn refresh(State(server): State<Server>, headers: HeaderMap) -> impl IntoResponse {
    if server.refresh_fails.load(Ordering::SeqCst) || bearer(&headers).is_none() {
        (StatusCode::INTERNAL_SERVER_ERROR, [("Bearer", String::new())])
    } else {
        (StatusCode::OK, [("Bearer", server.token)])
    }
}

async fn cohorts(headers: HeaderMap) -> StatusCode {
    if bearer(&headers).is_some() {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

struct Harness {
    settings: SessionSettings,
    storage_path: std::path::PathBuf,
    refresh_fails: Arc<AtomicBool>,
    _dir: TempDir,
}

impl Harness {
    async fn start() -> Self {
        let refresh_fails = Arc::new(AtomicBool::new(false));
        let state = Server {
            token: far_future_token(),
            refresh_fails: refresh_fails.clone(),
        };
        let app = Router::new()
            .route("/WebAPI/auth/login/db", post(login))
            .route("/WebAPI/user/me", get(me))
            .route("/WebAPI/user/refresh", get(refresh))
            .route("/WebAPI/cohorts", get(cohorts))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let dir = TempDir::new().unwrap();
        let settings = SessionSettings {
            api_base_url: format!("http://{addr}/WebAPI/"),
            ..SessionSettings::default()
        };
        Self {
            settings,
            storage_path: dir.path().join("session.json"),
            refresh_fails,
            _dir: dir,
        }
    }

    /// Builds a fresh process: new storage handle, client and coordinator.
    fn process(&self) -> (SessionCoordinator, Arc<RecordingNavigator>, Arc<ReqwestTransport>) {
        let storage = Arc::new(FileKeyValueStorage::open(&self.storage_path).unwrap());
        let transport = Arc::new(ReqwestTransport::new(&self.settings.api_base_url).unwrap());
        let config = SessionClientConfig::from(&self.settings);
        let client = SessionClient::new(
            transport.clone(),
            TokenStore::new(storage),
            Arc::new(PermissionCache::new(PermissionPolicy::new(config.enforcement))),
            Arc::new(SystemClock::new()),
            config,
        );
        let navigator = Arc::new(RecordingNavigator::new());
        let coordinator = SessionCoordinator::new(client, navigator.clone(), &self.settings);
        (coordinator, navigator, transport)
    }

    fn stored(&self, key: &str) -> Option<String> {
        FileKeyValueStorage::open(&self.storage_path).unwrap().get(key)
    }
}

#[tokio::test]
async fn test_demo_login_grants_everything() {
    let harness = Harness::start().await;
    let (coordinator, navigator, _) = harness.process();
    let provider = harness.settings.default_provider().unwrap();

    let outcome = coordinator
        .login_with_credentials(provider, "demo", "demo")
        .await;

    assert_eq!(outcome, LoginOutcome::Succeeded);
    let session = coordinator.snapshot();
    assert!(session.authenticated);
    assert_eq!(session.login(), Some("demo"));
    assert_eq!(session.user.as_ref().unwrap().label(), "Demo User");
    assert_eq!(session.token, Some(far_future_token()));

    let policy = PermissionPolicy::enforced();
    for requested in ["cohortdefinition:42:put", "user:me:get", "a:b:c"] {
        assert!(policy.is_permitted(requested, session.permissions()), "{requested}");
    }

    assert_eq!(navigator.routes(), vec![Route::new("/home")]);
    assert_eq!(harness.stored("bearerToken"), Some(far_future_token()));
    assert_eq!(harness.stored("authClient").as_deref(), Some("db"));
}

#[tokio::test]
async fn test_bad_credentials_surface_server_message() {
    let harness = Harness::start().await;
    let (coordinator, navigator, _) = harness.process();
    let provider = harness.settings.default_provider().unwrap();

    let outcome = coordinator
        .login_with_credentials(provider, "demo", "wrong")
        .await;

    assert_eq!(
        outcome,
        LoginOutcome::Failed("Invalid credentials".to_string())
    );
    let session = coordinator.snapshot();
    assert!(!session.authenticated);
    assert_eq!(session.last_error.as_deref(), Some("Invalid credentials"));
    assert!(navigator.history().is_empty());
    assert_eq!(harness.stored("bearerToken"), None);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let harness = Harness::start().await;
    {
        let (coordinator, _, _) = harness.process();
        let provider = harness.settings.default_provider().unwrap();
        coordinator
            .login_with_credentials(provider, "demo", "demo")
            .await;
    }

    let (coordinator, navigator, _) = harness.process();
    let session = coordinator.bootstrap().await;

    assert!(session.authenticated);
    assert_eq!(session.login(), Some("demo"));
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_restart_with_expired_token_starts_anonymous() {
    let harness = Harness::start().await;
    FileKeyValueStorage::open(&harness.storage_path)
        .unwrap()
        .set("bearerToken", &jwt(1_000_000_000));

    let (coordinator, navigator, _) = harness.process();
    let session = coordinator.bootstrap().await;

    assert_eq!(*session, Session::default());
    assert_eq!(harness.stored("bearerToken"), None);
    assert_eq!(navigator.routes(), vec![Route::new("/auth/login")]);
}

#[tokio::test]
async fn test_refresh_failure_logs_out() {
    let harness = Harness::start().await;
    let (coordinator, navigator, _) = harness.process();
    let provider = harness.settings.default_provider().unwrap();
    coordinator
        .login_with_credentials(provider, "demo", "demo")
        .await;

    assert_eq!(coordinator.refresh().await, RefreshOutcome::Refreshed);

    harness.refresh_fails.store(true, Ordering::SeqCst);
    let outcome = coordinator.refresh().await;

    assert!(matches!(outcome, RefreshOutcome::LoggedOut(_)));
    let session = coordinator.snapshot();
    assert!(!session.authenticated);
    assert_eq!(session.token, None);
    assert_eq!(harness.stored("bearerToken"), None);
    assert_eq!(
        navigator.history().last(),
        Some(&Navigation::Route(Route::new("/auth/login")))
    );
}

#[tokio::test]
async fn test_guards_and_authenticated_calls_follow_session() {
    let harness = Harness::start().await;
    let (coordinator, navigator, transport) = harness.process();
    let context = GuardContext::new(
        coordinator.subscribe(),
        coordinator.client().permissions().clone(),
        navigator.clone(),
        &harness.settings,
    );
    let auth_guard = AuthGuard::new(context.clone());
    let permission_guard = PermissionGuard::new(context);
    let api = AuthenticatedTransport::new(
        transport,
        RequestAuthenticator::new(coordinator.subscribe()),
    );

    let GuardDecision::Redirect(route) = auth_guard.check("/cohorts/7") else {
        panic!("anonymous access must redirect");
    };
    assert_eq!(route.query_param(RETURN_URL_PARAM), Some("/cohorts/7"));
    let anonymous = api.send(HttpRequest::get("cohorts")).await.unwrap();
    assert_eq!(anonymous.status, 401);
    assert!(!coordinator.snapshot().authenticated);

    let provider = harness.settings.default_provider().unwrap();
    coordinator
        .login_with_credentials(provider, "demo", "demo")
        .await;

    assert_eq!(auth_guard.check("/cohorts/7"), GuardDecision::Allow);
    assert_eq!(
        permission_guard.check("/cohorts/7", "cohortdefinition:7:put"),
        GuardDecision::Allow
    );
    let authorized = api.send(HttpRequest::get("cohorts")).await.unwrap();
    assert_eq!(authorized.status, 200);

    assert!(!coordinator.client().permissions().is_empty());

    coordinator.logout();
    coordinator.logout();
    assert_eq!(*coordinator.snapshot(), Session::default());
    assert!(coordinator.client().permissions().is_empty());
    assert!(!auth_guard.check("/cohorts/7").is_allowed());
    assert!(
        !permission_guard
            .check("/cohorts/7", "cohortdefinition:7:put")
            .is_allowed()
    );
}
