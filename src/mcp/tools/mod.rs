//! MCP Tools
//!
//! One module per area; each exposes its registration functions. The call
//! order below is the order `tools/list` reports.

pub mod builds;
pub mod configurations;
pub mod runtime;
pub mod tests;

use super::registry::McpRegistry;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    builds::register_tools(registry);
    configurations::register_search_tools(registry);
    runtime::register_tools(registry);
    tests::register_tools(registry);
    configurations::register_lookup_tools(registry);
}

#[cfg(test)]
mod registration_tests {
    use super::*;

    #[test]
    fn test_tool_listing_order() {
        let mut registry = McpRegistry::new();
        register_all_tools(&mut registry);
        let names: Vec<String> = registry
            .tool_definitions()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "trigger_build",
                "cancel_build",
                "pin_build",
                "set_build_tag",
                "download_artifact",
                "search_builds",
                "fetch_build_log",
                "search_build_configurations",
                "get_current_time",
                "get_test_results",
                "get_test_failures",
                "get_projects",
                "get_build_types",
            ]
        );
        for tool in registry.tool_definitions() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(!tool.description.is_empty());
        }
    }
}
