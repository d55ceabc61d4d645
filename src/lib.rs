//! Moodprobe: a greeting service whose liveness and readiness probes are
//! driven by the greetings it receives.
//!
//! `GET /?name=sad` makes `/health` fail until `GET /?name=happy`; any name
//! containing `busy` flips `/readiness`. Useful for exercising how a container
//! scheduler reacts to failing probes.

pub mod config;
pub mod error;
pub mod flags;
pub mod http;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::StartupError;
pub use routes::create_router;
pub use state::AppState;
