//! Session lifecycle.
//!
//! This module provides:
//! - Durable bearer-token storage
//! - The session client talking to the authentication provider
//! - The coordinator owning the session snapshot

mod coordinator;
mod session_client;
mod token_store;

pub use coordinator::{LoginOutcome, RefreshOutcome, SessionCoordinator};
pub use session_client::{
    LOGIN_FIELD, LoginSuccess, PASSWORD_FIELD, SessionClient, SessionClientConfig,
};
pub use token_store::{AUTH_CLIENT_KEY, TOKEN_KEY, TokenStore};
