//! Warden Domain - Session and permission types
//!
//! This crate defines the domain model of the session and access-control
//! core. All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod navigation;
pub mod permission;
pub mod session;
pub mod settings;

pub use auth::{
    BEARER_HEADER, BEARER_SCHEME, PermissionGrant, User, UserInfo, authorization_value,
    is_expired_at, token_expiration,
};
pub use error::{DomainError, DomainResult};
pub use navigation::{RETURN_URL_PARAM, Route};
pub use permission::{Permission, has_any_grant, is_granted};
pub use session::{Session, SessionEvent, SessionPhase};
pub use settings::{AuthProviderSettings, LoginMode, SessionSettings};
