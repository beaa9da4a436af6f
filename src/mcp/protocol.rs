//! MCP Protocol Types
//!
//! JSON-RPC 2.0 envelopes plus the MCP method payloads this gateway serves.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::teamcity::{ClientError, ResourceDescriptor};

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version we support
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// Core Message Types
// ============================================================================

/// Incoming request from an MCP client. `id: null` is treated like an absent
/// id, i.e. a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl McpRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Decode `params` into `T`; absent params become [`McpError::InvalidParams`].
    pub fn parse_params<T: serde::de::DeserializeOwned>(&self) -> Result<T, McpError> {
        let params = self
            .params
            .clone()
            .ok_or_else(|| McpError::InvalidParams(Some("missing params".to_string())))?;
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(Some(e.to_string())))
    }
}

/// Response to an MCP client. `id` is always present on the wire, `null` when
/// the request id could not be determined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<McpErrorResponse>,
}

impl McpResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, error: McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Request ID can be string or number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(serde_json::Number),
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ============================================================================
// Error Codes
// ============================================================================

/// JSON-RPC errors, each carrying optional detail text reported as `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpError {
    ParseError(Option<String>),
    InvalidRequest(Option<String>),
    MethodNotFound(Option<String>),
    InvalidParams(Option<String>),
    InternalError(Option<String>),
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::MethodNotFound(_) => -32601,
            McpError::InvalidParams(_) => -32602,
            McpError::InternalError(_) => -32603,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            McpError::ParseError(_) => "Parse error",
            McpError::InvalidRequest(_) => "Invalid Request",
            McpError::MethodNotFound(_) => "Method not found",
            McpError::InvalidParams(_) => "Invalid params",
            McpError::InternalError(_) => "Internal error",
        }
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            McpError::ParseError(data)
            | McpError::InvalidRequest(data)
            | McpError::MethodNotFound(data)
            | McpError::InvalidParams(data)
            | McpError::InternalError(data) => data.as_deref(),
        }
    }

    pub fn internal(data: impl Into<String>) -> Self {
        McpError::InternalError(Some(data.into()))
    }
}

impl std::fmt::Display for McpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.data() {
            Some(data) => write!(f, "{}: {}", self.message(), data),
            None => f.write_str(self.message()),
        }
    }
}

impl std::error::Error for McpError {}

impl From<ClientError> for McpError {
    fn from(err: ClientError) -> Self {
        McpError::internal(err.to_string())
    }
}

impl From<McpError> for McpErrorResponse {
    fn from(err: McpError) -> Self {
        McpErrorResponse {
            code: err.code(),
            message: err.message().to_string(),
            data: err.data().map(|d| Value::String(d.to_string())),
        }
    }
}

// ============================================================================
// MCP Method Names
// ============================================================================

pub mod methods {
    // Lifecycle
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "initialized";
    pub const NOTIFICATIONS_INITIALIZED: &str = "notifications/initialized";
    pub const NOTIFICATIONS_CANCELLED: &str = "notifications/cancelled";

    // Tools
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";

    // Resources
    pub const RESOURCES_LIST: &str = "resources/list";
    pub const RESOURCES_READ: &str = "resources/read";

    // Ping
    pub const PING: &str = "ping";

    pub const KNOWN: &[&str] = &[
        INITIALIZE,
        INITIALIZED,
        NOTIFICATIONS_INITIALIZED,
        NOTIFICATIONS_CANCELLED,
        TOOLS_LIST,
        TOOLS_CALL,
        RESOURCES_LIST,
        RESOURCES_READ,
        PING,
    ];
}

// ============================================================================
// Initialize Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    pub resources: ResourcesCapability,
    pub tools: EmptyObject,
    pub logging: EmptyObject,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            resources: ResourcesCapability {
                subscribe: false,
                list_changed: false,
            },
            tools: EmptyObject {},
            logging: EmptyObject {},
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    pub subscribe: bool,
    pub list_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyObject {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

// ============================================================================
// Tools Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolsCallResult {
    pub content: Vec<ToolResultContent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolResultContent {
    Text { text: String },
}

impl ToolsCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
        }
    }
}

// ============================================================================
// Resources Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ResourcesListResult {
    pub resources: Vec<ResourceDescriptor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourcesListParams {
    /// Empty (absent or `null`) lists the static catalog.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uri: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourcesReadParams {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourcesReadResult {
    pub contents: Vec<ResourceContent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

// ============================================================================
// Ping
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PingResult {}
