//! MCP Dispatcher
//!
//! Transport-agnostic: raw bytes in, optional raw bytes out. Every transport
//! (HTTP, WebSocket, stdio) funnels its messages through [`McpDispatcher::handle`].

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::clock::{self, Zone};
use super::context::ToolContext;
use super::protocol::{
    methods, InitializeResult, McpError, McpRequest, McpResponse, PingResult, RequestId,
    ResourcesListParams, ResourcesListResult, ResourcesReadParams, ResourcesReadResult,
    ServerCapabilities, ServerInfo, ToolsCallParams, ToolsListResult, JSONRPC_VERSION,
    MCP_PROTOCOL_VERSION,
};
use super::registry::McpRegistry;
use crate::cache::TtlCache;
use crate::server::metrics::record_mcp_request;
use crate::teamcity::{ClientError, TeamCityClient};

/// Metric label for methods outside the known set
const UNKNOWN_METHOD_LABEL: &str = "unknown";

type HandlerResult = Result<Value, McpError>;

/// Routes parsed JSON-RPC requests to protocol handlers, tools and resources.
/// Stateless per call and safe to share across connections.
pub struct McpDispatcher {
    registry: Arc<McpRegistry>,
    client: Arc<TeamCityClient>,
    cache: Arc<TtlCache>,
    server_version: String,
}

impl McpDispatcher {
    pub fn new(
        registry: Arc<McpRegistry>,
        client: Arc<TeamCityClient>,
        cache: Arc<TtlCache>,
        server_version: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            client,
            cache,
            server_version: server_version.into(),
        }
    }

    /// Build a dispatcher over the full tool and resource catalog.
    pub fn with_default_registry(
        client: Arc<TeamCityClient>,
        cache: Arc<TtlCache>,
        server_version: impl Into<String>,
    ) -> Self {
        Self::new(Arc::new(create_registry()), client, cache, server_version)
    }

    pub fn registry(&self) -> &McpRegistry {
        &self.registry
    }

    /// Handle one raw message. `None` means nothing should be written back.
    pub async fn handle(&self, raw: &[u8], cancel: &CancellationToken) -> Option<Vec<u8>> {
        let response = self.handle_message(raw, cancel).await?;
        match serde_json::to_vec(&response) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Failed to serialize MCP response: {}", e);
                None
            }
        }
    }

    pub async fn handle_message(
        &self,
        raw: &[u8],
        cancel: &CancellationToken,
    ) -> Option<McpResponse> {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(e) => {
                debug!("Rejecting malformed MCP message: {}", e);
                return Some(McpResponse::error(
                    None,
                    McpError::ParseError(Some(e.to_string())),
                ));
            }
        };

        let request: McpRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                return Some(McpResponse::error(
                    envelope_id(&value),
                    McpError::InvalidRequest(Some(e.to_string())),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(McpResponse::error(
                request.id.clone(),
                McpError::InvalidRequest(Some(format!(
                    "unsupported jsonrpc version {:?}",
                    request.jsonrpc
                ))),
            ));
        }

        let method = request.method.as_str();
        if matches!(
            method,
            methods::INITIALIZED | methods::NOTIFICATIONS_INITIALIZED | methods::NOTIFICATIONS_CANCELLED
        ) {
            debug!("MCP notification {}", method);
            return None;
        }

        if !methods::KNOWN.contains(&method) {
            let start = Instant::now();
            if request.is_notification() {
                debug!("Ignoring unknown MCP notification {}", method);
                return None;
            }
            record_mcp_request(UNKNOWN_METHOD_LABEL, false, start.elapsed());
            return Some(McpResponse::error(
                request.id.clone(),
                McpError::MethodNotFound(Some(method.to_string())),
            ));
        }

        debug!("MCP request {} (id: {:?})", method, request.id);
        let start = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(McpError::internal("request cancelled")),
            result = self.route(&request, cancel) => result,
        };
        record_mcp_request(method, result.is_ok(), start.elapsed());

        if let Err(e) = &result {
            warn!("MCP {} failed: {}", method, e);
        }

        if request.is_notification() {
            return None;
        }

        Some(match result {
            Ok(value) => McpResponse::success(request.id, value),
            Err(e) => McpResponse::error(request.id, e),
        })
    }

    async fn route(&self, request: &McpRequest, cancel: &CancellationToken) -> HandlerResult {
        match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(),
            methods::PING => to_json(PingResult {}),
            methods::TOOLS_LIST => to_json(ToolsListResult {
                tools: self.registry.tool_definitions(),
            }),
            methods::TOOLS_CALL => self.handle_tools_call(request, cancel).await,
            methods::RESOURCES_LIST => self.handle_resources_list(request, cancel).await,
            methods::RESOURCES_READ => self.handle_resources_read(request, cancel).await,
            other => Err(McpError::MethodNotFound(Some(other.to_string()))),
        }
    }

    fn context(&self, cancel: &CancellationToken) -> ToolContext {
        ToolContext {
            client: self.client.clone(),
            cache: self.cache.clone(),
            cancel: cancel.clone(),
            server_version: self.server_version.clone(),
        }
    }

    fn handle_initialize(&self) -> HandlerResult {
        let now = Zone::Local.now();
        to_json(InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: crate::SERVER_NAME.to_string(),
                version: self.server_version.clone(),
                current_time: Some(clock::rfc3339(&now)),
                current_date: Some(clock::date(&now)),
                timezone: Some(Zone::Local.label(&now)),
            },
        })
    }

    async fn handle_tools_call(
        &self,
        request: &McpRequest,
        cancel: &CancellationToken,
    ) -> HandlerResult {
        let params: ToolsCallParams = request.parse_params()?;
        let tool = self
            .registry
            .get_tool(&params.name)
            .ok_or_else(|| McpError::internal(format!("unknown tool: {}", params.name)))?;

        debug!("Calling tool {}", tool.name);
        let result = (tool.handler)(self.context(cancel), params.arguments).await?;
        to_json(result)
    }

    async fn handle_resources_list(
        &self,
        request: &McpRequest,
        cancel: &CancellationToken,
    ) -> HandlerResult {
        let params: ResourcesListParams = match &request.params {
            None | Some(Value::Null) => ResourcesListParams::default(),
            Some(_) => request.parse_params()?,
        };

        let resources = if params.uri.is_empty() {
            self.registry.resource_catalog()
        } else {
            let list = self
                .registry
                .find_collection(&params.uri)
                .and_then(|resource| resource.list_handler.clone())
                .ok_or_else(|| McpError::from(ClientError::UnsupportedResource(params.uri.clone())))?;
            list(self.context(cancel)).await?
        };

        to_json(ResourcesListResult { resources })
    }

    async fn handle_resources_read(
        &self,
        request: &McpRequest,
        cancel: &CancellationToken,
    ) -> HandlerResult {
        let params: ResourcesReadParams = request.parse_params()?;
        let resource = self
            .registry
            .find_resource(&params.uri)
            .ok_or_else(|| McpError::from(ClientError::UnsupportedResource(params.uri.clone())))?;

        let contents = (resource.read_handler)(self.context(cancel), params.uri).await?;
        to_json(ResourcesReadResult { contents })
    }
}

/// Build the registry with every tool and resource this server exposes.
pub fn create_registry() -> McpRegistry {
    let mut registry = McpRegistry::new();
    super::tools::register_all_tools(&mut registry);
    super::resources::register_all_resources(&mut registry);

    info!(
        "MCP registry initialized with {} tools and {} resources",
        registry.tool_count(),
        registry.resource_count()
    );
    registry
}

fn to_json<T: Serialize>(value: T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| McpError::internal(e.to_string()))
}

/// Best-effort id recovery from an envelope that failed shape validation.
fn envelope_id(value: &Value) -> Option<RequestId> {
    value
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value(id).ok())
}
