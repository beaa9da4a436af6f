//! Test Occurrence Tools

use serde_json::{json, Value};

use crate::mcp::context::ToolContext;
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};
use crate::teamcity::{parse_args, TestResultsArgs};

/// Register test tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(get_test_results_tool());
    registry.register_tool(get_test_failures_tool());
}

fn get_test_results_tool() -> RegisteredTool {
    ToolBuilder::new("get_test_results")
        .description("Get test results for a build, optionally filtered by status")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildId": {"type": "string", "description": "Build ID"},
                "status": {
                    "type": "string",
                    "description": "Test status filter: SUCCESS, FAILURE, UNKNOWN"
                },
                "includeDetails": {
                    "type": "boolean",
                    "description": "Include failure details (stack traces) in results"
                },
                "count": {
                    "type": "integer",
                    "description": "Maximum number of tests to return (default: 100)",
                    "minimum": 1,
                    "maximum": 1000
                }
            },
            "required": ["buildId"]
        }))
        .build(get_test_results_handler)
}

async fn get_test_results_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: TestResultsArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.get_test_results(args).await?))
}

fn get_test_failures_tool() -> RegisteredTool {
    ToolBuilder::new("get_test_failures")
        .description("Get failing tests for a build")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "buildId": {"type": "string", "description": "Build ID"}
            },
            "required": ["buildId"]
        }))
        .build(get_test_failures_handler)
}

async fn get_test_failures_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let args: TestResultsArgs = parse_args(params)?;
    Ok(ToolsCallResult::text(ctx.client.get_test_failures(args).await?))
}
