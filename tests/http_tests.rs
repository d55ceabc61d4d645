//! End-to-end tests against an in-process server.
//!
//! Each test starts its own router and flag state on an ephemeral port, so
//! tests can run in parallel without sharing flags.

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use moodprobe::config::AppConfig;
use moodprobe::flags::FlagMode;
use moodprobe::http::{Lifecycle, ServerError};
use moodprobe::identity::HostIdentity;
use moodprobe::{create_router, AppState};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A running server plus the handles needed to inspect and stop it.
struct TestServer {
    addr: SocketAddr,
    state: AppState,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn start(state: AppState) -> Self {
        let lifecycle = Lifecycle::new(state.config.http.shutdown_timeout())
            .with_read_timeout(state.config.http.read_timeout());
        let handle = lifecycle.handle();
        let (tx, rx) = oneshot::channel::<()>();

        let app = create_router(state.clone());
        let task = tokio::spawn(lifecycle.run(
            app,
            "127.0.0.1:0".parse().unwrap(),
            async move {
                let _ = rx.await;
            },
        ));

        let addr = tokio::time::timeout(Duration::from_secs(5), handle.listening())
            .await
            .expect("server did not start in time")
            .expect("server failed to bind");

        Self {
            addr,
            state,
            client: reqwest::Client::new(),
            shutdown: Some(tx),
            task,
        }
    }

    async fn with_host(host: &str) -> Self {
        Self::start(AppState::with_identity(
            AppConfig::default(),
            HostIdentity::Fixed(host.to_string()),
        ))
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> (u16, String) {
        let response = self
            .client
            .get(self.url(path))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .expect("request failed");
        let status = response.status().as_u16();
        (status, response.text().await.expect("body"))
    }

    async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(15), self.task)
            .await
            .expect("shutdown exceeded drain deadline")
            .expect("lifecycle task panicked")
    }
}

#[tokio::test]
async fn test_greeting_defaults_to_guest() {
    let server = TestServer::with_host("web-1").await;

    let (status, body) = server.get("/").await;
    assert_eq!(status, 200);
    assert_eq!(body, "Hello, guest from container web-1 (sad: false, busy: false)\n");

    let (_, body) = server.get("/?name=").await;
    assert!(body.starts_with("Hello, guest from container web-1"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_sad_and_happy_drive_health() {
    let server = TestServer::with_host("web-1").await;

    assert_eq!(server.get("/health").await, (200, "ok".to_string()));

    let (_, body) = server.get("/?name=SAD").await;
    assert!(body.contains("(sad: true, busy: false)"));
    assert_eq!(server.get("/health").await, (500, "error".to_string()));

    // Names that are neither sad nor happy leave distress alone.
    server.get("/?name=sadness").await;
    assert_eq!(server.get("/health").await, (500, "error".to_string()));

    let (_, body) = server.get("/?name=Happy").await;
    assert!(body.contains("(sad: false, busy: false)"));
    assert_eq!(server.get("/health").await, (200, "ok".to_string()));

    // Happy while already healthy is a no-op.
    server.get("/?name=happy").await;
    assert_eq!(server.get("/health").await, (200, "ok".to_string()));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_busy_toggles_readiness() {
    let server = TestServer::with_host("web-1").await;

    assert_eq!(server.get("/readiness").await, (200, "ok".to_string()));

    let (_, body) = server.get("/?name=very-BUSY").await;
    assert!(body.contains("busy: true"));
    assert_eq!(server.get("/readiness").await, (500, "busy".to_string()));

    server.get("/?name=busybody").await;
    assert_eq!(server.get("/readiness").await, (200, "ok".to_string()));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_probes_are_independent() {
    let server = TestServer::with_host("web-1").await;

    server.get("/?name=sad").await;
    assert_eq!(server.get("/readiness").await, (200, "ok".to_string()));

    server.get("/?name=happy").await;
    server.get("/?name=busy").await;
    assert_eq!(server.get("/health").await, (200, "ok".to_string()));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_long_host_identity_is_truncated() {
    let host = "k8s-node-pool-a-deployment-7d9f8c-xk2p9";
    assert_eq!(host.len(), 39);
    let server = TestServer::with_host(host).await;

    let (_, body) = server.get("/?name=Ada").await;
    let expected_tail = &host[host.len() - 32..];
    assert_eq!(
        body,
        format!(
            "Hello, Ada from container {} (sad: false, busy: false)\n",
            expected_tail
        )
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_repeated_name_parameter_is_not_rejected() {
    let server = TestServer::with_host("web-1").await;

    let (status, body) = server.get("/?name=Ada&name=sad&extra=1").await;
    assert_eq!(status, 200);
    assert!(body.starts_with("Hello, Ada from"));
    assert!(!server.state.flags.distress());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_responses_are_not_cacheable_and_carry_request_id() {
    let server = TestServer::with_host("web-1").await;

    for path in ["/", "/health", "/readiness"] {
        let response = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "no-store",
            "path {}",
            path
        );
        assert!(response.headers().contains_key("x-request-id"), "path {}", path);
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = TestServer::with_host("web-1").await;
    let (status, _) = server.get("/metrics").await;
    assert_eq!(status, 404);
    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_busy_requests_even_count_restores_readiness() {
    let server = TestServer::with_host("web-1").await;

    let requests = (0..64).map(|i| server.get(if i % 2 == 0 { "/?name=busy" } else { "/?name=BUSY" }));
    let responses = join_all(requests).await;
    assert!(responses.iter().all(|(status, _)| *status == 200));

    assert!(!server.state.flags.congestion());
    assert_eq!(server.get("/readiness").await, (200, "ok".to_string()));

    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_busy_requests_odd_count_leaves_congested() {
    let server = TestServer::with_host("web-1").await;

    let responses = join_all((0..33).map(|_| server.get("/?name=busy"))).await;
    assert_eq!(responses.len(), 33);

    assert_eq!(server.get("/readiness").await, (500, "busy".to_string()));

    server.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_greetings_report_own_congestion_write() {
    let server = TestServer::with_host("web-1").await;

    // With atomic flags each toggle observes a distinct prior value, so
    // exactly half of an even batch report busy: true.
    let responses = join_all((0..40).map(|_| server.get("/?name=busy"))).await;
    let set = responses
        .iter()
        .filter(|(_, body)| body.contains("busy: true"))
        .count();
    assert_eq!(set, 20);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_racy_mode_matches_sequential_semantics() {
    let mut config = AppConfig::default();
    config.flags.mode = FlagMode::Racy;
    let server = TestServer::start(AppState::with_identity(
        config,
        HostIdentity::Fixed("web-1".to_string()),
    ))
    .await;

    server.get("/?name=sad").await;
    server.get("/?name=busy").await;
    assert_eq!(server.get("/health").await, (500, "error".to_string()));
    assert_eq!(server.get("/readiness").await, (500, "busy".to_string()));

    server.get("/?name=happy").await;
    server.get("/?name=busy").await;
    assert_eq!(server.get("/health").await, (200, "ok".to_string()));
    assert_eq!(server.get("/readiness").await, (200, "ok".to_string()));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_accepting_connections() {
    let server = TestServer::with_host("web-1").await;
    let addr = server.addr;

    assert_eq!(server.get("/health").await.0, 200);
    server.stop().await.unwrap();

    let result = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .timeout(Duration::from_secs(2))
        .send()
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_incomplete_request_head_is_closed_after_read_timeout() {
    let mut config = AppConfig::default();
    config.http.read_timeout_seconds = 1;
    let server = TestServer::start(AppState::with_identity(
        config,
        HostIdentity::Fixed("web-1".to_string()),
    ))
    .await;

    // Request line and one header, but never the blank line ending the head.
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /?name=sad HTTP/1.1\r\nHost: a\r\n")
        .await
        .unwrap();

    let mut received = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received)).await;
    assert!(
        closed.is_ok(),
        "connection still open 5s after a 1s read timeout"
    );

    // The half-sent greeting never reached the handler.
    assert!(!server.state.flags.distress());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_routes_accept_any_method() {
    let server = TestServer::with_host("web-1").await;

    let response = server
        .client
        .post(server.url("/?name=sad"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        "Hello, sad from container web-1 (sad: true, busy: false)\n"
    );

    let response = server.client.put(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "error");

    let response = server
        .client
        .delete(server.url("/readiness"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    server.stop().await.unwrap();
}
