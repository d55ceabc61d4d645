//! Moodprobe binary entry point.
//!
//! Initializes tracing, loads optional TOML configuration, builds the router
//! over fresh flag state, and runs the listener until SIGINT/SIGTERM. A
//! listener that cannot start is fatal and exits non-zero; a graceful
//! shutdown always exits 0.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moodprobe::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER};
use moodprobe::http::{shutdown_signal, Lifecycle};
use moodprobe::{create_router, AppState, StartupError};

/// Moodprobe: a greeting service with request-driven health and readiness probes
#[derive(Parser, Debug)]
#[command(name = "moodprobe", version, about)]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level filter (e.g., "moodprobe=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Listener port, overrides http.port from the configuration file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = Args::parse();

    // Configuration comes first so logging.format can pick the output layer.
    // Errors here happen before tracing exists, so they go to stderr via the
    // returned error.
    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    match config.logging.format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    tracing::info!(
        port = config.http.port,
        identity_env = %config.identity.env_var,
        flag_mode = ?config.flags.mode,
        "Loaded configuration"
    );

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, "Invalid listener address");
            return Err(e.into());
        }
    };
    let drain_timeout = config.http.shutdown_timeout();
    let read_timeout = config.http.read_timeout();

    let state = AppState::new(config);
    let app = create_router(state);

    let lifecycle = Lifecycle::new(drain_timeout).with_read_timeout(read_timeout);
    let signal = shutdown_signal();
    let shutdown = async move {
        let signal = signal.await;
        tracing::info!(signal, "Termination signal received");
    };

    if let Err(e) = lifecycle.run(app, addr, shutdown).await {
        tracing::error!(error = %e, "HTTP server failed to start");
        return Err(e.into());
    }

    Ok(())
}
