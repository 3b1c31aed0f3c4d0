//! Warden - Main Entry Point
//!
//! Headless session client: loads settings, restores the persisted session
//! and, when credentials are provided through the environment, logs in.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use warden_application::ports::{HttpRequest, HttpTransport, KeyValueStorage};
use warden_application::{
    AuthenticatedTransport, LoginOutcome, PermissionCache, PermissionPolicy,
    RequestAuthenticator, SessionClient, SessionClientConfig, SessionCoordinator, TokenStore,
};
use warden_domain::{LoginMode, SessionSettings};
use warden_infrastructure::persistence::storage_path;
use warden_infrastructure::{
    FileKeyValueStorage, MemoryKeyValueStorage, ReqwestTransport, SettingsRepository,
    SystemClock, TracingNavigator,
};

const ENV_USERNAME: &str = "WARDEN_USERNAME";
const ENV_PASSWORD: &str = "WARDEN_PASSWORD";
const ENV_PROVIDER: &str = "WARDEN_PROVIDER";
const ENV_PROBE_PATH: &str = "WARDEN_PROBE_PATH";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Warden v{}", env!("CARGO_PKG_VERSION"));

    let settings = SettingsRepository::new().load().await?;
    let storage = open_storage(&settings)?;
    let transport = Arc::new(ReqwestTransport::new(&settings.api_base_url)?);

    let config = SessionClientConfig::from(&settings);
    let policy = PermissionPolicy::new(config.enforcement);
    let client = SessionClient::new(
        transport.clone(),
        TokenStore::new(storage),
        Arc::new(PermissionCache::new(policy)),
        Arc::new(SystemClock::new()),
        config,
    );
    let navigator = Arc::new(TracingNavigator::new());
    let coordinator = SessionCoordinator::new(client, navigator.clone(), &settings);

    let mut session = coordinator.bootstrap().await;
    if !session.authenticated {
        login_from_env(&coordinator, &settings).await?;
        session = coordinator.snapshot();
    }

    match session.user.as_ref() {
        Some(user) => info!(
            user = %user.label(),
            permissions = user.permissions.len(),
            expires_at = ?session.token_expires_at,
            "session ready"
        ),
        None => info!(error = ?session.last_error, "no active session"),
    }

    if let Ok(path) = std::env::var(ENV_PROBE_PATH) {
        let probe = AuthenticatedTransport::new(
            transport,
            RequestAuthenticator::new(coordinator.subscribe()),
        );
        let response = probe.send(HttpRequest::get(path.clone())).await?;
        info!(%path, status = response.status, "probe finished");
    }

    if let Some(location) = navigator.current() {
        info!(%location, "final location");
    }

    Ok(())
}

/// Opens the configured storage file, falling back to memory when the
/// platform has no data directory.
fn open_storage(
    settings: &SessionSettings,
) -> Result<Arc<dyn KeyValueStorage>, Box<dyn std::error::Error>> {
    if let Some(path) = storage_path(settings) {
        Ok(Arc::new(FileKeyValueStorage::open(path)?))
    } else {
        warn!("no data directory available, the session will not survive a restart");
        Ok(Arc::new(MemoryKeyValueStorage::new()))
    }
}

/// Logs in with the provider named by `WARDEN_PROVIDER`, or the default one.
async fn login_from_env(
    coordinator: &SessionCoordinator,
    settings: &SessionSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = match std::env::var(ENV_PROVIDER) {
        Ok(name) => settings.provider(&name),
        Err(_) => settings.default_provider(),
    };
    let Some(provider) = provider else {
        warn!("no authentication provider configured");
        return Ok(());
    };

    let outcome = match provider.mode {
        LoginMode::Credentials => {
            let (Ok(username), Ok(password)) =
                (std::env::var(ENV_USERNAME), std::env::var(ENV_PASSWORD))
            else {
                info!("set {ENV_USERNAME} and {ENV_PASSWORD} to log in");
                return Ok(());
            };
            coordinator
                .login_with_credentials(provider, &username, &password)
                .await
        }
        LoginMode::Ajax => coordinator.login_via_ajax(provider).await,
        LoginMode::Redirect => {
            coordinator.login_via_redirect(provider)?;
            return Ok(());
        }
    };

    match outcome {
        LoginOutcome::Succeeded => info!(provider = %provider.name, "logged in"),
        LoginOutcome::Failed(message) => warn!(provider = %provider.name, "login failed: {message}"),
        LoginOutcome::Dropped | LoginOutcome::Discarded => {}
    }
    Ok(())
}
