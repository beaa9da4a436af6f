//! Runtime Tools

use serde::Deserialize;
use serde_json::{json, Value};

use crate::mcp::clock::{self, Zone};
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};
use crate::teamcity::parse_args;

/// Register runtime tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(get_current_time_tool());
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CurrentTimeParams {
    format: String,
    timezone: String,
}

impl Default for CurrentTimeParams {
    fn default() -> Self {
        Self {
            format: "rfc3339".to_string(),
            timezone: "Local".to_string(),
        }
    }
}

fn get_current_time_tool() -> RegisteredTool {
    ToolBuilder::new("get_current_time")
        .description("Get the current server date and time - use this to get the real current date/time instead of assuming any training data dates")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Date format (rfc3339, date, timestamp, or a custom strftime pattern)",
                    "default": "rfc3339"
                },
                "timezone": {
                    "type": "string",
                    "description": "Timezone (e.g., 'UTC', 'Local', 'America/New_York', '+05:30')",
                    "default": "Local"
                }
            }
        }))
        .build(get_current_time_handler)
}

async fn get_current_time_handler(_ctx: ToolContext, params: Value) -> ToolResult {
    let params: CurrentTimeParams = parse_args(params)?;
    Ok(ToolsCallResult::text(current_time_text(&params)?))
}

fn current_time_text(params: &CurrentTimeParams) -> Result<String, McpError> {
    let zone: Zone = params.timezone.parse().map_err(McpError::internal)?;
    let now = zone.now();

    let rendered = match params.format.as_str() {
        "" | "rfc3339" => clock::rfc3339(&now),
        "date" => clock::date(&now),
        "timestamp" => now.timestamp().to_string(),
        pattern => clock::custom(&now, pattern).map_err(McpError::internal)?,
    };

    Ok(format!(
        "Current time: {}\nTimezone: {}\nNote: This is the REAL current date/time. Use this for all time-based operations instead of any training data dates.",
        rendered,
        zone.label(&now)
    ))
}
