//! Termination signal handling.
//!
//! SIGINT (Ctrl+C) and SIGTERM both begin a graceful shutdown: the listener
//! stops accepting connections and in-flight requests get the configured
//! drain deadline to finish.

use std::future::Future;

/// Install SIGINT and SIGTERM handlers and return a future that resolves
/// with the name of the first signal received.
///
/// Handlers are installed when this is called, not when the future is first
/// polled, so a signal arriving before the listener is up is not lost. A
/// handler that cannot be installed is logged and never fires; the other
/// one still does. Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = &'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let sigterm = signal(SignalKind::terminate())
        .inspect_err(|e| tracing::error!(error = %e, "Failed to install SIGTERM handler"))
        .ok();
    let sigint = signal(SignalKind::interrupt())
        .inspect_err(|e| tracing::error!(error = %e, "Failed to install SIGINT handler"))
        .ok();

    async move {
        let terminate = async {
            match sigterm {
                Some(mut sigterm) => {
                    sigterm.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        let interrupt = async {
            match sigint {
                Some(mut sigint) => {
                    sigint.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = interrupt => {
                tracing::info!("Received SIGINT, initiating graceful shutdown");
                "SIGINT"
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
                "SIGTERM"
            }
        }
    }
}

/// Wait for Ctrl+C (non-Unix platforms).
#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = &'static str> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        "CTRL_C"
    }
}
