//! Startup errors surfaced by the binary.
//!
//! Requests have no error path of their own: every input is normalized by the
//! handlers, so the only failures are configuration and listener startup.

use crate::config::ConfigError;
use crate::http::ServerError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),
}
