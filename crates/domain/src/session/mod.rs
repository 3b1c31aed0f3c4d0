//! Session snapshot and the events that drive it.
//!
//! The session is modelled as an immutable value. Every change goes through
//! [`Session::apply`], a pure function from the current snapshot and one
//! [`SessionEvent`] to the next snapshot. Side effects (network, storage,
//! navigation) belong to the caller.

mod event;
mod state;

pub use event::SessionEvent;
pub use state::{Session, SessionPhase};
