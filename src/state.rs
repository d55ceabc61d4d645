//! Shared application state for request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::flags::FlagStore;
use crate::identity::HostIdentity;

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
///
/// Holds the distress/congestion flags and how to resolve the host identity.
/// Each `AppState::new` call owns a fresh set of flags, so tests can build
/// isolated instances.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub flags: FlagStore,
    pub identity: Arc<HostIdentity>,
}

impl AppState {
    /// Creates state from configuration, reading the identity from the configured env var.
    pub fn new(config: AppConfig) -> Self {
        let identity = HostIdentity::Env(config.identity.env_var.clone());
        Self::with_identity(config, identity)
    }

    /// Creates state with an explicit identity source.
    pub fn with_identity(config: AppConfig, identity: HostIdentity) -> Self {
        Self {
            flags: FlagStore::new(config.flags.mode),
            config: Arc::new(config),
            identity: Arc::new(identity),
        }
    }
}
