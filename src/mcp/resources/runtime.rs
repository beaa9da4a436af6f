//! Runtime Resource
//!
//! `teamcity://runtime`: the server's real clock, so clients stop guessing
//! the date.

use chrono::Utc;
use serde_json::{json, Value};

use super::json_content;
use crate::mcp::clock::{self, Zone};
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{
    McpRegistry, RegisteredResource, ResourceBuilder, ResourceListResult, ResourceResult,
};
use crate::teamcity::{ResourceDescriptor, SCHEME};

pub const RUNTIME_NOTE: &str = "This is the REAL current date and time. Do not use any training data dates. Use this information for all time-based queries and operations.";

/// Register the runtime resource with the registry
pub fn register_resources(registry: &mut McpRegistry) {
    registry.register_resource(runtime_resource());
}

fn runtime_uri() -> String {
    format!("{}://runtime", SCHEME)
}

fn runtime_resource() -> RegisteredResource {
    ResourceBuilder::new(runtime_uri(), "Runtime Information")
        .description("Current server date, time, and runtime information")
        .list_with(list_runtime)
        .build(runtime_handler)
}

async fn list_runtime(_ctx: ToolContext) -> ResourceListResult {
    Ok(vec![ResourceDescriptor::new(
        runtime_uri(),
        "Runtime Information",
        "Current server date, time, and runtime information",
    )])
}

async fn runtime_handler(ctx: ToolContext, uri: String) -> ResourceResult {
    Ok(vec![json_content(uri, &runtime_info(&ctx.server_version))?])
}

pub fn runtime_info(server_version: &str) -> Value {
    let now = Zone::Local.now();
    let utc = now.with_timezone(&Utc).fixed_offset();
    json!({
        "type": "runtime-info",
        "currentTime": clock::rfc3339(&now),
        "currentDate": clock::date(&now),
        "currentTimestamp": now.timestamp(),
        "timezone": Zone::Local.label(&now),
        "utcTime": clock::rfc3339(&utc),
        "utcDate": clock::date(&utc),
        "utcTimestamp": utc.timestamp(),
        "serverInfo": {
            "name": crate::SERVER_NAME,
            "version": server_version,
        },
        "note": RUNTIME_NOTE,
    })
}
