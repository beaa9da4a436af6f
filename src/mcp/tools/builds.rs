//! Build Tools
//!
//! Queueing, cancelling, pinning, tagging, searching and log retrieval.

use serde_json::{json, Value};

use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};
use crate::teamcity::{
    parse_args, CancelBuildArgs, DownloadArtifactArgs, FetchBuildLogArgs, PinBuildArgs,
    SearchBuildsArgs, SetBuildTagArgs, TriggerBuildArgs,
};

/// Register build tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(trigger_build_tool());
    registry.register_tool(cancel_build_tool());
    registry.register_tool(pin_build_tool());
    registry.register_tool(set_build_tag_tool());
    registry.register_tool(download_artifact_tool());
    registry.register_tool(search_builds_tool());
    registry.register_tool(fetch_build_log_tool());
}

fn build_id_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description
    })
}

// ============================================================================
// trigger_build
// ============================================================================

fn trigger_build_tool() -> RegisteredTool {
    ToolBuilder::new("trigger_build")
        .description("Trigger a new build")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildTypeId": {
                    "type": "string",
                    "description": "Build configuration ID"
                },
                "branchName": {
                    "type": "string",
                    "description": "Branch name (optional)"
                },
                "properties": {
                    "type": "object",
                    "description": "Build properties",
                    "additionalProperties": {"type": "string"}
                },
                "comment": {
                    "type": "string",
                    "description": "Comment attached to the queued build"
                }
            },
            "required": ["buildTypeId"]
        }))
        .build(trigger_build_handler)
}

async fn trigger_build_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: TriggerBuildArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.trigger_build(args).await?))
}

// ============================================================================
// cancel_build
// ============================================================================

fn cancel_build_tool() -> RegisteredTool {
    ToolBuilder::new("cancel_build")
        .description("Cancel a running build")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildId": build_id_schema("Build ID to cancel"),
                "comment": {
                    "type": "string",
                    "description": "Cancellation comment"
                }
            },
            "required": ["buildId"]
        }))
        .build(cancel_build_handler)
}

async fn cancel_build_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: CancelBuildArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.cancel_build(args).await?))
}

// ============================================================================
// pin_build
// ============================================================================

fn pin_build_tool() -> RegisteredTool {
    ToolBuilder::new("pin_build")
        .description("Pin or unpin a build")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildId": build_id_schema("Build ID to pin/unpin"),
                "pin": {
                    "type": "boolean",
                    "description": "True to pin, false to unpin"
                },
                "comment": {
                    "type": "string",
                    "description": "Pin comment"
                }
            },
            "required": ["buildId", "pin"]
        }))
        .build(pin_build_handler)
}

async fn pin_build_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: PinBuildArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.pin_build(args).await?))
}

// ============================================================================
// set_build_tag
// ============================================================================

fn set_build_tag_tool() -> RegisteredTool {
    ToolBuilder::new("set_build_tag")
        .description("Add or remove build tags")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildId": build_id_schema("Build ID"),
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Tags to add"
                },
                "removeTags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Tags to remove"
                }
            },
            "required": ["buildId"]
        }))
        .build(set_build_tag_handler)
}

async fn set_build_tag_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: SetBuildTagArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.set_build_tag(args).await?))
}

// ============================================================================
// download_artifact
// ============================================================================

fn download_artifact_tool() -> RegisteredTool {
    ToolBuilder::new("download_artifact")
        .description("Download build artifacts")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildId": build_id_schema("Build ID"),
                "artifactPath": {
                    "type": "string",
                    "description": "Artifact path"
                }
            },
            "required": ["buildId", "artifactPath"]
        }))
        .build(download_artifact_handler)
}

async fn download_artifact_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: DownloadArtifactArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.download_artifact(args).await?))
}

// ============================================================================
// search_builds
// ============================================================================

fn search_builds_tool() -> RegisteredTool {
    ToolBuilder::new("search_builds")
        .description("Search for builds with various filters")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildTypeId": {"type": "string", "description": "Build configuration ID to filter by"},
                "status": {"type": "string", "description": "Build status: SUCCESS, FAILURE, ERROR, UNKNOWN"},
                "state": {"type": "string", "description": "Build state: queued, running, finished"},
                "branch": {"type": "string", "description": "Branch name to filter by"},
                "agent": {"type": "string", "description": "Agent name to filter by"},
                "user": {"type": "string", "description": "User who triggered the build"},
                "sinceBuild": {"type": "string", "description": "Search builds since this build ID"},
                "sinceDate": {"type": "string", "description": "Search builds since this date (YYYYMMDDTHHMMSS+HHMM)"},
                "untilDate": {"type": "string", "description": "Search builds until this date (YYYYMMDDTHHMMSS+HHMM)"},
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Tags to filter by"
                },
                "personal": {"type": "boolean", "description": "Include personal builds"},
                "pinned": {"type": "boolean", "description": "Filter by pinned status"},
                "project": {"type": "string", "description": "Project locator to filter by"},
                "number": {"type": "string", "description": "Build number to filter by"},
                "hanging": {"type": "boolean", "description": "Filter by hanging status"},
                "canceled": {"type": "boolean", "description": "Filter by canceled status"},
                "failedToStart": {"type": "boolean", "description": "Filter builds that failed to start"},
                "composite": {"type": "boolean", "description": "Filter composite builds"},
                "tag": {"type": "string", "description": "Single tag to filter by"},
                "property": {
                    "type": "object",
                    "description": "Build parameters to match, name to value",
                    "additionalProperties": {"type": "string"}
                },
                "compatibleAgent": {"type": "string", "description": "Agent locator the build must be compatible with"},
                "dates": {"type": "string", "description": "Raw date condition appended to the locator"},
                "count": {
                    "type": "integer",
                    "description": "Maximum number of builds to return (default: 100)",
                    "minimum": 1,
                    "maximum": 1000
                }
            }
        }))
        .build(search_builds_handler)
}

async fn search_builds_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: SearchBuildsArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.search_builds(args).await?))
}

// ============================================================================
// fetch_build_log
// ============================================================================

fn fetch_build_log_tool() -> RegisteredTool {
    ToolBuilder::new("fetch_build_log")
        .description("Fetch build log for a specific build with filtering options")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildId": build_id_schema("Build ID to fetch log for"),
                "plain": {"type": "boolean", "description": "Return log as plain text (default: true)"},
                "archived": {"type": "boolean", "description": "Return log as zip archive (default: false)"},
                "dateFormat": {"type": "string", "description": "Custom timestamp format (Java SimpleDateFormat)"},
                "maxLines": {
                    "type": "integer",
                    "description": "Maximum number of lines to return (limits output after filtering)"
                },
                "filterPattern": {
                    "type": "string",
                    "description": "Regex pattern to filter log lines (only matching lines are returned)"
                },
                "severity": {
                    "type": "string",
                    "description": "Filter by severity level: 'error', 'warning', or 'info'",
                    "enum": ["error", "warning", "info"]
                },
                "tailLines": {
                    "type": "integer",
                    "description": "Return only the last N lines (applied after filtering, before maxLines)"
                }
            },
            "required": ["buildId"]
        }))
        .build(fetch_build_log_handler)
}

async fn fetch_build_log_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: FetchBuildLogArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.fetch_build_log(args).await?))
}
