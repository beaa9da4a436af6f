//! MCP Tool and Resource Registry
//!
//! Built once at startup, then shared read-only behind an `Arc`. Tools keep
//! their registration order so `tools/list` is stable.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use super::context::ToolContext;
use super::protocol::{McpError, ResourceContent, ToolDefinition, ToolsCallResult};
use crate::teamcity::{ResourceDescriptor, JSON_MIME};

// ============================================================================
// Tool Types
// ============================================================================

/// Result type for tool execution
pub type ToolResult = Result<ToolsCallResult, McpError>;

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool handler function type
pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

/// A registered tool with metadata and handler
pub struct RegisteredTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub handler: ToolHandler,
}

// ============================================================================
// Resource Types
// ============================================================================

/// Result type for resource read
pub type ResourceResult = Result<Vec<ResourceContent>, McpError>;

/// Boxed future for async resource read
pub type ResourceFuture = Pin<Box<dyn Future<Output = ResourceResult> + Send>>;

/// Resource handler function type
pub type ResourceHandler = Arc<dyn Fn(ToolContext, String) -> ResourceFuture + Send + Sync>;

pub type ResourceListResult = Result<Vec<ResourceDescriptor>, McpError>;
pub type ResourceListFuture = Pin<Box<dyn Future<Output = ResourceListResult> + Send>>;

/// Enumerates the members of a collection resource
pub type ResourceListHandler = Arc<dyn Fn(ToolContext) -> ResourceListFuture + Send + Sync>;

/// A registered resource. `uri` is the collection root; reads match the root
/// itself, `{root}/{id}` and `{root}?{query}`.
pub struct RegisteredResource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    /// Whether it shows up in the `resources/list` catalog
    pub listed: bool,
    pub list_handler: Option<ResourceListHandler>,
    pub read_handler: ResourceHandler,
}

impl RegisteredResource {
    fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor {
            uri: self.uri.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    fn covers(&self, uri: &str) -> bool {
        match uri.strip_prefix(self.uri.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registry for MCP tools and resources
pub struct McpRegistry {
    tools: Vec<RegisteredTool>,
    resources: Vec<RegisteredResource>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Register a tool. A later registration with the same name replaces the
    /// earlier one in place.
    pub fn register_tool(&mut self, tool: RegisteredTool) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Register a resource
    pub fn register_resource(&mut self, resource: RegisteredResource) {
        self.resources.push(resource);
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema.clone(),
            })
            .collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Metadata for every listed resource; never touches the upstream.
    pub fn resource_catalog(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .filter(|r| r.listed)
            .map(RegisteredResource::descriptor)
            .collect()
    }

    /// Resource registered exactly at `uri`, used by `resources/list`.
    pub fn find_collection(&self, uri: &str) -> Option<&RegisteredResource> {
        self.resources.iter().find(|r| r.uri == uri)
    }

    /// Resource whose root covers `uri`, used by `resources/read`.
    pub fn find_resource(&self, uri: &str) -> Option<&RegisteredResource> {
        self.resources.iter().find(|r| r.covers(uri))
    }

    /// Get the number of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Get the number of registered resources
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }
}

impl Default for McpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        RegisteredTool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}

/// Builder for registering a resource
pub struct ResourceBuilder {
    uri: String,
    name: String,
    description: String,
    mime_type: String,
    listed: bool,
    list_handler: Option<ResourceListHandler>,
}

impl ResourceBuilder {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: String::new(),
            mime_type: JSON_MIME.to_string(),
            listed: true,
            list_handler: None,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Keep the resource readable but out of the `resources/list` catalog.
    pub fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    pub fn list_with<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResourceListResult> + Send + 'static,
    {
        self.list_handler = Some(Arc::new(move |ctx| Box::pin(handler(ctx))));
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredResource
    where
        F: Fn(ToolContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResourceResult> + Send + 'static,
    {
        RegisteredResource {
            uri: self.uri,
            name: self.name,
            description: self.description,
            mime_type: self.mime_type,
            listed: self.listed,
            list_handler: self.list_handler,
            read_handler: Arc::new(move |ctx, uri| Box::pin(handler(ctx, uri))),
        }
    }
}
