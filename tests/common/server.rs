//! Test server lifecycle management
//!
//! This module spawns a gateway in front of a fresh mock TeamCity. Each test
//! gets an isolated pair with its own cache and request log.

use super::constants::*;
use super::upstream::MockTeamCity;
use std::sync::Arc;
use std::time::Duration;
use teamcity_mcp::cache::TtlCache;
use teamcity_mcp::config::{TeamCitySettings, UpstreamAuth};
use teamcity_mcp::server::{metrics::init_metrics, serve};
use teamcity_mcp::{McpDispatcher, RequestsLoggingLevel, ServerConfig, ServerState, TeamCityClient};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Gateway plus mock upstream
///
/// When dropped, the gateway shuts down through its cancellation token and
/// the mock upstream stops with it.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the gateway is listening on
    pub port: u16,

    /// The mock TeamCity the gateway talks to
    pub upstream: MockTeamCity,

    /// Dispatcher shared with the HTTP app, for stdio-style tests
    pub dispatcher: Arc<McpDispatcher>,

    shutdown: CancellationToken,
}

impl TestServer {
    /// Spawns an unauthenticated gateway on a random port
    pub async fn spawn() -> Self {
        Self::spawn_with_secret(None).await
    }

    /// Spawns a gateway that requires `Bearer hex(HMAC(secret))`
    pub async fn spawn_authenticated() -> Self {
        Self::spawn_with_secret(Some(TEST_SECRET)).await
    }

    /// # Panics
    ///
    /// Panics if the port cannot be bound or the gateway is not ready within
    /// [`SERVER_READY_TIMEOUT_MS`].
    pub async fn spawn_with_secret(secret: Option<&str>) -> Self {
        init_metrics();
        let upstream = MockTeamCity::spawn().await;

        let client = TeamCityClient::new(&TeamCitySettings {
            url: upstream.base_url.clone(),
            auth: UpstreamAuth::Bearer(UPSTREAM_TOKEN.to_string()),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        })
        .expect("Failed to build TeamCity client");
        let client = Arc::new(client);

        let dispatcher = Arc::new(McpDispatcher::with_default_registry(
            client.clone(),
            Arc::new(TtlCache::new(Duration::from_secs(60))),
            "e2e",
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            listen_addr: format!("127.0.0.1:{}", port),
            server_secret: secret.map(str::to_string),
        };

        let shutdown = CancellationToken::new();
        let state = ServerState::new(config, "e2e", dispatcher.clone(), client, shutdown.clone());

        tokio::spawn(async move {
            serve(listener, state).await.expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upstream,
            dispatcher,
            shutdown,
        };
        server.wait_for_ready().await;
        server
    }

    /// WebSocket URL of the MCP endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/mcp", self.port)
    }

    /// Polls `/healthz`, which is open even when auth is on.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/healthz", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
