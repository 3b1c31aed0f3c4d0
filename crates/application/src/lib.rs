//! Warden Application - Session orchestration and ports
//!
//! This crate defines the application layer with:
//! - Port traits (interfaces for storage, transport, navigation and time)
//! - The session client and coordinator
//! - Permission policy, request authentication and route guards
//! - Application-level error handling

pub mod auth;
pub mod error;
pub mod guards;
pub mod interceptor;
pub mod permissions;
pub mod ports;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use auth::{
    LoginOutcome, LoginSuccess, RefreshOutcome, SessionClient, SessionClientConfig,
    SessionCoordinator, TokenStore,
};
pub use error::{GENERIC_LOGIN_FAILURE, SessionError, SessionResult};
pub use guards::{AuthGuard, GuardContext, GuardDecision, GuestGuard, PermissionGuard};
pub use interceptor::{AuthenticatedTransport, RequestAuthenticator};
pub use permissions::{AuthEnforcement, PermissionCache, PermissionPolicy};
pub use ports::{
    Clock, HttpMethod, HttpRequest, HttpResponse, HttpTransport, KeyValueStorage, Navigator,
    StorageError, TransportError,
};
