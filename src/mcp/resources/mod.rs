//! MCP Resources
//!
//! TeamCity collections plus the runtime info resource.

mod runtime;
mod teamcity;

use serde_json::Value;

use super::protocol::{McpError, ResourceContent};
use super::registry::McpRegistry;
use crate::teamcity::JSON_MIME;

/// Register all resources with the registry
pub fn register_all_resources(registry: &mut McpRegistry) {
    teamcity::register_resources(registry);
    runtime::register_resources(registry);
}

fn json_content(uri: String, value: &Value) -> Result<ResourceContent, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| McpError::internal(e.to_string()))?;
    Ok(ResourceContent {
        uri,
        mime_type: JSON_MIME.to_string(),
        text,
    })
}
