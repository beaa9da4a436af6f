//! TeamCity Resources
//!
//! `teamcity://{projects,buildTypes,builds,agents}[/{id}]` and the unlisted
//! `teamcity://artifacts?locator=build:{id}`. Reads go through the TTL cache
//! keyed by URI; listings always hit the upstream.

use super::json_content;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{
    McpRegistry, RegisteredResource, ResourceBuilder, ResourceListResult, ResourceResult,
};
use crate::teamcity::SCHEME;

/// Register TeamCity resources with the registry
pub fn register_resources(registry: &mut McpRegistry) {
    registry.register_resource(projects_resource());
    registry.register_resource(build_types_resource());
    registry.register_resource(builds_resource());
    registry.register_resource(agents_resource());
    registry.register_resource(artifacts_resource());
}

fn collection_uri(collection: &str) -> String {
    format!("{}://{}", SCHEME, collection)
}

fn projects_resource() -> RegisteredResource {
    ResourceBuilder::new(collection_uri("projects"), "Projects")
        .description("TeamCity projects")
        .list_with(list_projects)
        .build(read_cached)
}

fn build_types_resource() -> RegisteredResource {
    ResourceBuilder::new(collection_uri("buildTypes"), "Build Types")
        .description("TeamCity build configurations")
        .list_with(list_build_types)
        .build(read_cached)
}

fn builds_resource() -> RegisteredResource {
    ResourceBuilder::new(collection_uri("builds"), "Builds")
        .description("Recent TeamCity builds")
        .list_with(list_builds)
        .build(read_cached)
}

fn agents_resource() -> RegisteredResource {
    ResourceBuilder::new(collection_uri("agents"), "Agents")
        .description("TeamCity build agents")
        .list_with(list_agents)
        .build(read_cached)
}

fn artifacts_resource() -> RegisteredResource {
    ResourceBuilder::new(collection_uri("artifacts"), "Artifacts")
        .description("Artifacts of a build, addressed as artifacts?locator=build:{id}")
        .unlisted()
        .build(read_cached)
}

async fn list_projects(ctx: ToolContext) -> ResourceListResult {
    Ok(ctx.client.list_projects().await?)
}

async fn list_build_types(ctx: ToolContext) -> ResourceListResult {
    Ok(ctx.client.list_build_types().await?)
}

async fn list_builds(ctx: ToolContext) -> ResourceListResult {
    Ok(ctx.client.list_builds().await?)
}

async fn list_agents(ctx: ToolContext) -> ResourceListResult {
    Ok(ctx.client.list_agents().await?)
}

async fn read_cached(ctx: ToolContext, uri: String) -> ResourceResult {
    let value = match ctx.cache.get(&uri) {
        Some(value) => value,
        None => {
            let value = ctx.client.get_resource(&uri).await?;
            ctx.cache.set(uri.clone(), value.clone());
            value
        }
    };
    Ok(vec![json_content(uri, &value)?])
}
