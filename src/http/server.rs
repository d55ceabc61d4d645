//! Listener lifecycle: start, run until a shutdown signal, drain, stop.
//!
//! The listener runs on its own task so the calling task is free to wait for
//! the shutdown future. Lifecycle progress is published as a [`Phase`] on a
//! watch channel:
//!
//! `Stopped -> Starting -> Running -> Draining -> Stopped`

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use hyper_util::rt::TokioTimer;
use tokio::sync::watch;

use crate::config::DEFAULT_READ_TIMEOUT_SECS;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Where the listener is in its single-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Starting,
    Running,
    Draining,
}

/// Owns the listener handle and drives it through its phases.
pub struct Lifecycle {
    handle: Handle,
    phase: watch::Sender<Phase>,
    drain_timeout: Duration,
    read_timeout: Duration,
}

impl Lifecycle {
    /// Create a stopped lifecycle that allows `drain_timeout` for in-flight
    /// requests once shutdown begins.
    pub fn new(drain_timeout: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Stopped);
        Self {
            handle: Handle::new(),
            phase,
            drain_timeout,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }

    /// Close connections that have not sent a complete request head within
    /// `timeout`.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Listener handle; `listening()` on it yields the bound address.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Serve `app` on `addr` until `shutdown` resolves, then drain.
    ///
    /// Returns an error only when the listener fails before shutdown was
    /// requested (e.g. the port is taken). Once draining starts the result is
    /// always `Ok`: requests still running at the deadline are abandoned.
    pub async fn run<F>(self, app: Router, addr: SocketAddr, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        self.set_phase(Phase::Starting);
        tracing::info!(%addr, "Starting HTTP server");

        let mut server = tokio::spawn(serve(app, addr, self.handle.clone(), self.read_timeout));

        tokio::select! {
            result = &mut server => {
                self.set_phase(Phase::Stopped);
                return Err(listener_failure(result));
            }
            bound = self.handle.listening() => {
                match bound {
                    Some(bound) => tracing::info!(addr = %bound, "Server listening"),
                    None => {
                        self.set_phase(Phase::Stopped);
                        return Err(listener_failure((&mut server).await));
                    }
                }
            }
        }
        self.set_phase(Phase::Running);

        tokio::select! {
            result = &mut server => {
                self.set_phase(Phase::Stopped);
                return Err(listener_failure(result));
            }
            _ = shutdown => {}
        }

        self.set_phase(Phase::Draining);
        tracing::info!(
            timeout_secs = self.drain_timeout.as_secs(),
            "Graceful shutdown initiated, draining in-flight requests"
        );
        self.handle.graceful_shutdown(Some(self.drain_timeout));

        // The handle force-closes connections at the deadline; the outer
        // timeout only guards against the listener task itself hanging.
        match tokio::time::timeout(self.drain_timeout + DRAIN_GRACE, &mut server).await {
            Ok(Ok(Ok(()))) => tracing::debug!("Listener drained"),
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Listener reported an error while draining"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Listener task failed while draining"),
            Err(_) => {
                tracing::warn!("Drain deadline exceeded, abandoning in-flight requests");
                server.abort();
            }
        }

        self.set_phase(Phase::Stopped);
        tracing::info!("Shutting down");
        Ok(())
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.send_replace(phase);
        tracing::debug!(?phase, "Lifecycle phase changed");
    }
}

/// Slack past the drain deadline before the listener task is aborted.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

async fn serve(
    app: Router,
    addr: SocketAddr,
    handle: Handle,
    read_timeout: Duration,
) -> std::io::Result<()> {
    let mut server = axum_server::bind(addr).handle(handle);
    // hyper only enforces the header timeout when it has a timer
    server
        .http_builder()
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout);

    server.serve(app.into_make_service()).await
}

fn listener_failure(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> ServerError {
    match result {
        Ok(Err(e)) => ServerError::Bind(e),
        Ok(Ok(())) => ServerError::Server("listener stopped unexpectedly".to_string()),
        Err(e) => ServerError::Server(e.to_string()),
    }
}
