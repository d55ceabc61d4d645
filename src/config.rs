//! Configuration loading and constants.
//!
//! Loads application configuration from an optional TOML file and defines the
//! defaults for listener timeouts, host identity display, flag synchronization,
//! and logging. Without a file, `AppConfig::default()` yields the stock
//! behavior: port 8080, 10 second timeouts, `HOSTNAME` identity.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::flags::FlagMode;

// =============================================================================
// HTTP Listener
// =============================================================================

/// Default bind host (all interfaces)
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listener port
pub const DEFAULT_PORT: u16 = 8080;

/// Maximum time allowed to read a request head or body
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;

/// Maximum time allowed to produce and write a response
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 10;

/// Drain deadline for in-flight requests after a termination signal
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Cache-Control value for every response. Probe results and greetings
/// depend on mutable process state and must never be cached.
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

// =============================================================================
// Greeting / Host Identity
// =============================================================================

/// Name used when the `name` query parameter is absent or empty
pub const DEFAULT_GUEST_NAME: &str = "guest";

/// Environment variable holding the container/host name
pub const DEFAULT_IDENTITY_ENV_VAR: &str = "HOSTNAME";

/// Maximum number of trailing identity characters shown in a greeting
pub const DEFAULT_IDENTITY_MAX_CHARS: usize = 32;

// =============================================================================
// Logging
// =============================================================================

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "moodprobe=info,tower_http=info";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Host identity shown in greetings
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Shared flag synchronization
    #[serde(default)]
    pub flags: FlagsConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
    #[serde(default = "HttpServerConfig::default_read_timeout")]
    pub read_timeout_seconds: u64,
    #[serde(default = "HttpServerConfig::default_write_timeout")]
    pub write_timeout_seconds: u64,
    /// Deadline for draining in-flight requests on shutdown
    #[serde(default = "HttpServerConfig::default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            read_timeout_seconds: Self::default_read_timeout(),
            write_timeout_seconds: Self::default_write_timeout(),
            shutdown_timeout_seconds: Self::default_shutdown_timeout(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }

    fn default_read_timeout() -> u64 {
        DEFAULT_READ_TIMEOUT_SECS
    }

    fn default_write_timeout() -> u64 {
        DEFAULT_WRITE_TIMEOUT_SECS
    }

    fn default_shutdown_timeout() -> u64 {
        DEFAULT_SHUTDOWN_TIMEOUT_SECS
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_seconds)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Host identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Environment variable read on every greeting
    #[serde(default = "IdentityConfig::default_env_var")]
    pub env_var: String,
    #[serde(default = "IdentityConfig::default_max_display_chars")]
    pub max_display_chars: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            env_var: Self::default_env_var(),
            max_display_chars: Self::default_max_display_chars(),
        }
    }
}

impl IdentityConfig {
    fn default_env_var() -> String {
        DEFAULT_IDENTITY_ENV_VAR.to_string()
    }

    fn default_max_display_chars() -> usize {
        DEFAULT_IDENTITY_MAX_CHARS
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlagsConfig {
    #[serde(default)]
    pub mode: FlagMode,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the listener address from `http.host` and `http.port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.http.host, self.http.port)
            .parse()
            .map_err(|e| ConfigError::Validation(format!("Invalid http.host or http.port: {}", e)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("http.read_timeout_seconds", self.http.read_timeout_seconds),
            ("http.write_timeout_seconds", self.http.write_timeout_seconds),
            ("http.shutdown_timeout_seconds", self.http.shutdown_timeout_seconds),
        ];
        if let Some((key, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Validation(format!("{} must be greater than 0", key)));
        }

        if self.identity.max_display_chars == 0 {
            return Err(ConfigError::Validation(
                "identity.max_display_chars must be greater than 0".to_string(),
            ));
        }

        self.socket_addr().map(|_| ())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
