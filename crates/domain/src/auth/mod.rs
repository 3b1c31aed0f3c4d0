//! Authentication domain types

mod token;
mod user;

pub use token::{
    BEARER_HEADER, BEARER_SCHEME, authorization_value, is_expired_at, token_expiration,
};
pub use user::{PermissionGrant, User, UserInfo};
