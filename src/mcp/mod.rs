//! MCP (Model Context Protocol) Gateway
//!
//! Speaks JSON-RPC 2.0 to MCP clients and translates tool calls and resource
//! reads into TeamCity REST requests.
//!
//! ## Architecture
//!
//! - Transports: HTTP `POST /mcp`, WebSocket on `GET /mcp`, stdio
//! - Dispatcher: bytes in, optional bytes out, shared by all transports
//! - Tools: build actions and searches, each returning a text block
//! - Resources: `teamcity://` collections, cached for a short TTL

pub mod clock;
pub mod context;
pub mod dispatcher;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod tools;

pub use dispatcher::{create_registry, McpDispatcher};
pub use protocol::{McpError, McpRequest, McpResponse};
pub use registry::McpRegistry;
