//! HTTP listener lifecycle.
//!
//! The listener is served by `axum-server` on a background task while the
//! caller waits for a termination signal. On SIGTERM/SIGINT it stops
//! accepting connections, lets in-flight requests finish within the drain
//! deadline, and reports `Stopped`.

mod server;
mod shutdown;

pub use server::{Lifecycle, Phase, ServerError};
pub use shutdown::shutdown_signal;
