use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use super::ServerConfig;
use crate::mcp::McpDispatcher;
use crate::teamcity::ReadinessProbe;

pub type GuardedDispatcher = Arc<McpDispatcher>;
pub type GuardedReadinessProbe = Arc<dyn ReadinessProbe>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub version: String,
    pub dispatcher: GuardedDispatcher,
    pub readiness: GuardedReadinessProbe,
    /// Cancelled on shutdown; every connection derives a child token from it.
    pub shutdown: CancellationToken,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedDispatcher {
    fn from_ref(input: &ServerState) -> Self {
        input.dispatcher.clone()
    }
}

impl FromRef<ServerState> for GuardedReadinessProbe {
    fn from_ref(input: &ServerState) -> Self {
        input.readiness.clone()
    }
}
