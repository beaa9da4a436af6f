//! Configuration Tools
//!
//! Project and build configuration lookups, plus the detailed configuration
//! search.

use serde_json::{json, Value};

use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};
use crate::teamcity::{parse_args, GetBuildTypesArgs, GetProjectsArgs, SearchBuildConfigurationsArgs};

/// Register the detailed configuration search
pub fn register_search_tools(registry: &mut McpRegistry) {
    registry.register_tool(search_build_configurations_tool());
}

/// Register the project and build configuration lookups
pub fn register_lookup_tools(registry: &mut McpRegistry) {
    registry.register_tool(get_projects_tool());
    registry.register_tool(get_build_types_tool());
}

fn paging_schema() -> (Value, Value) {
    (
        json!({"type": "integer", "description": "Index of the first item to return", "minimum": 0}),
        json!({
            "type": "integer",
            "description": "Maximum number of items to return (default: 100)",
            "minimum": 1,
            "maximum": 1000
        }),
    )
}

fn search_build_configurations_tool() -> RegisteredTool {
    ToolBuilder::new("search_build_configurations")
        .description(
            "Search for build configurations with comprehensive filters including basic filters, parameters, steps, and VCS roots",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "projectId": {"type": "string", "description": "Filter by project ID"},
                "name": {"type": "string", "description": "Search by configuration name (partial matching)"},
                "enabled": {"type": "boolean", "description": "Filter by enabled status"},
                "paused": {"type": "boolean", "description": "Filter by paused status"},
                "template": {
                    "type": "boolean",
                    "description": "Filter templates (true) or regular configurations (false)"
                },
                "parameterName": {"type": "string", "description": "Search by parameter name (partial matching)"},
                "parameterValue": {"type": "string", "description": "Search by parameter value (partial matching)"},
                "stepType": {
                    "type": "string",
                    "description": "Search by build step type (e.g., 'gradle', 'docker', 'powershell')"
                },
                "stepName": {"type": "string", "description": "Search by build step name (partial matching)"},
                "vcsType": {"type": "string", "description": "Search by VCS type (e.g., 'git', 'subversion')"},
                "includeDetails": {
                    "type": "boolean",
                    "description": "Include detailed information (parameters, steps, VCS) in results (default: false)"
                },
                "count": {
                    "type": "integer",
                    "description": "Maximum number of configurations to return (default: 100)",
                    "minimum": 1,
                    "maximum": 1000
                }
            }
        }))
        .build(search_build_configurations_handler)
}

async fn search_build_configurations_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: SearchBuildConfigurationsArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(
        ctx.client.search_build_configurations(args).await?,
    ))
}

fn get_projects_tool() -> RegisteredTool {
    let (start, count) = paging_schema();
    ToolBuilder::new("get_projects")
        .description("Get a project by ID, or list projects matching locator filters")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Project ID; when set, other filters are ignored"},
                "name": {"type": "string", "description": "Project name"},
                "archived": {"type": "boolean", "description": "Filter by archived status"},
                "virtual": {"type": "boolean", "description": "Filter virtual projects"},
                "parentProject": {"type": "string", "description": "Direct parent project locator"},
                "affectedProject": {"type": "string", "description": "Ancestor project locator"},
                "build": {"type": "string", "description": "Build locator"},
                "buildType": {"type": "string", "description": "Build configuration locator"},
                "vcsRoot": {"type": "string", "description": "VCS root locator"},
                "start": start,
                "count": count
            }
        }))
        .build(get_projects_handler)
}

async fn get_projects_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: GetProjectsArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.get_projects(args).await?))
}

fn get_build_types_tool() -> RegisteredTool {
    let (start, count) = paging_schema();
    ToolBuilder::new("get_build_types")
        .description("Get a build configuration by ID, or list configurations matching locator filters")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "id": {"type": "string", "description": "Build configuration ID; when set, other filters are ignored"},
                "project": {"type": "string", "description": "Direct project locator"},
                "affectedProject": {"type": "string", "description": "Ancestor project locator"},
                "name": {"type": "string", "description": "Configuration name"},
                "paused": {"type": "boolean", "description": "Filter by paused status"},
                "template": {"type": "boolean", "description": "Configurations attached to this template"},
                "templateFlag": {"type": "boolean", "description": "true for templates only, false for regular configurations"},
                "vcsRoot": {"type": "string", "description": "VCS root locator"},
                "build": {"type": "string", "description": "Build locator"},
                "start": start,
                "count": count
            }
        }))
        .build(get_build_types_handler)
}

async fn get_build_types_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: GetBuildTypesArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.get_build_types(args).await?))
}
