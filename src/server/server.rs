use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{
    auth::require_bearer,
    health::{healthz, readyz},
    log_requests,
    metrics::metrics_handler,
    state::*,
    websocket::ws_handler,
    ServerConfig,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub tools: usize,
    pub resources: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let registry = state.dispatcher.registry();
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: state.version.clone(),
        tools: registry.tool_count(),
        resources: registry.resource_count(),
    })
}

/// `POST /mcp`: the body is one JSON-RPC message. Notifications get 202 with
/// an empty body.
async fn mcp_post(State(state): State<ServerState>, body: Bytes) -> Response {
    let cancel = state.shutdown.child_token();
    // Dropped with the request future if the client goes away.
    let _guard = cancel.clone().drop_guard();

    match state.dispatcher.handle(&body, &cancel).await {
        Some(reply) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            reply,
        )
            .into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        version: impl Into<String>,
        dispatcher: GuardedDispatcher,
        readiness: GuardedReadinessProbe,
        shutdown: CancellationToken,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            version: version.into(),
            dispatcher,
            readiness,
            shutdown,
        }
    }
}

pub fn make_app(state: ServerState) -> Router {
    let mcp_routes: Router = Router::new()
        .route("/", get(home))
        .route("/mcp", get(ws_handler).post(mcp_post))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            require_bearer,
        ))
        .with_state(state.clone());

    let open_routes: Router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics_handler))
        .with_state(state.clone());

    mcp_routes
        .merge(open_routes)
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            log_requests,
        ))
}

/// Serve HTTP and WebSocket MCP on `listener` until `state.shutdown` fires.
pub async fn serve(listener: TcpListener, state: ServerState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = make_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let addr = state.config.listen_addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("MCP server listening on {}", addr);
    serve(listener, state).await?;
    info!("HTTP server stopped");
    Ok(())
}
