//! Infrastructure adapters

mod reqwest_transport;
mod system_clock;
mod tracing_navigator;

pub use reqwest_transport::{DEFAULT_TIMEOUT, ReqwestTransport};
pub use system_clock::SystemClock;
pub use tracing_navigator::TracingNavigator;
