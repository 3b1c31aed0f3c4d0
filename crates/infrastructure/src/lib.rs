//! Warden Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod persistence;

pub use adapters::{ReqwestTransport, SystemClock, TracingNavigator};
pub use persistence::{
    FileKeyValueStorage, MemoryKeyValueStorage, SettingsError, SettingsRepository,
};
