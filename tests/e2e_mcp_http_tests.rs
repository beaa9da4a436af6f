//! End-to-end tests for JSON-RPC over `POST /mcp`
//!
//! Every test runs the gateway against the mock TeamCity and checks both the
//! MCP reply and the upstream traffic it caused.

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn data(error: &Value) -> &str {
    error["data"].as_str().unwrap_or_default()
}

// ============================================================================
// Protocol
// ============================================================================

#[tokio::test]
async fn test_initialize_reports_server_info_without_upstream_calls() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let result = client
        .rpc_ok(
            "initialize",
            json!({"protocolVersion": "2024-11-05", "clientInfo": {"name": "e2e"}}),
        )
        .await;

    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "teamcity-mcp");
    assert_eq!(result["serverInfo"]["version"], "e2e");
    assert!(result["serverInfo"]["currentTime"].is_string());
    assert!(result["serverInfo"]["currentDate"].is_string());
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
    assert_eq!(server.upstream.request_count(), 0);
}

#[tokio::test]
async fn test_tools_list_returns_catalog_in_order() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let result = client.rpc_ok("tools/list", json!({})).await;
    let names: Vec<&str> = result["tools"]
        .as_array()
        .expect("tools is not an array")
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();

    assert_eq!(names, TOOL_NAMES);
    assert_eq!(result["tools"][0]["inputSchema"]["required"], json!(["buildTypeId"]));
    for tool in result["tools"].as_array().unwrap() {
        assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
    }
}

#[tokio::test]
async fn test_ping_returns_empty_object() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    assert_eq!(client.rpc_ok("ping", json!(null)).await, json!({}));
}

#[tokio::test]
async fn test_malformed_json_yields_parse_error_with_null_id() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.post_mcp_raw("{not json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);
    assert!(body["id"].is_null());
}

#[tokio::test]
async fn test_wrong_version_yields_invalid_request() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post_mcp_raw(r#"{"jsonrpc":"1.0","id":7,"method":"ping"}"#)
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], 7);
}

#[tokio::test]
async fn test_unknown_method_yields_method_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let error = client.rpc_err("prompts/list", json!({})).await;
    assert_eq!(error["code"], -32601);
}

#[tokio::test]
async fn test_notifications_are_accepted_without_body() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for body in [
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        r#"{"jsonrpc":"2.0","method":"initialized"}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}"#,
        r#"{"jsonrpc":"2.0","method":"no/such/method"}"#,
    ] {
        let response = client.post_mcp_raw(body).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED, "{}", body);
        assert!(response.text().await.unwrap().is_empty());
    }
}

// ============================================================================
// Resources
// ============================================================================

#[tokio::test]
async fn test_resources_list_without_uri_is_static() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let result = client.rpc_ok("resources/list", json!({})).await;
    let uris: Vec<&str> = result["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();

    for expected in [
        "teamcity://projects",
        "teamcity://buildTypes",
        "teamcity://builds",
        "teamcity://agents",
    ] {
        assert!(uris.contains(&expected), "missing {}", expected);
    }
    assert_eq!(server.upstream.request_count(), 0);
}

#[tokio::test]
async fn test_resources_list_builds_makes_one_upstream_call() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let result = client
        .rpc_ok("resources/list", json!({"uri": "teamcity://builds"}))
        .await;

    let resources = result["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["uri"], format!("teamcity://builds/{}", BUILD_ID));
    assert_eq!(resources[0]["name"], format!("Build #{}", BUILD_NUMBER));
    assert_eq!(resources[0]["description"], "Status: SUCCESS");

    let requests = server.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path_and_query, "/app/rest/builds?locator=count:100");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some(format!("Bearer {}", UPSTREAM_TOKEN).as_str())
    );
}

#[tokio::test]
async fn test_resources_list_agents() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let result = client
        .rpc_ok("resources/list", json!({"uri": "teamcity://agents"}))
        .await;
    let resources = result["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["name"], AGENT_NAME);
}

#[tokio::test]
async fn test_resources_read_is_cached() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let params = json!({"uri": "teamcity://projects"});

    let first = client.rpc_ok("resources/read", params.clone()).await;
    let contents = first["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0]["uri"], "teamcity://projects");
    assert_eq!(contents[0]["mimeType"], "application/json");
    let body: Value = serde_json::from_str(contents[0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(server.upstream.request_count(), 1);

    let second = client.rpc_ok("resources/read", params).await;
    assert_eq!(second, first);
    assert_eq!(server.upstream.request_count(), 1);
}

#[tokio::test]
async fn test_resources_read_single_build() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let result = client
        .rpc_ok(
            "resources/read",
            json!({"uri": format!("teamcity://builds/{}", BUILD_ID)}),
        )
        .await;
    let body: Value =
        serde_json::from_str(result["contents"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(body["number"], BUILD_NUMBER);
    assert_eq!(
        server.upstream.requests()[0].path_and_query,
        format!("/app/rest/builds/id:{}", BUILD_ID)
    );
}

#[tokio::test]
async fn test_resources_read_unsupported_uri() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let error = client
        .rpc_err("resources/read", json!({"uri": "file:///etc/passwd"}))
        .await;
    assert_eq!(error["code"], -32603);
    assert!(data(&error).contains("unsupported resource URI"));
    assert_eq!(server.upstream.request_count(), 0);
}

// ============================================================================
// Tools
// ============================================================================

#[tokio::test]
async fn test_cancel_build_rejects_non_numeric_id_before_upstream() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let error = client
        .call_tool_err("cancel_build", json!({"buildId": "abc"}))
        .await;
    assert_eq!(error["code"], -32603);
    assert!(data(&error).contains("invalid build ID"), "{}", error);
    assert_eq!(server.upstream.request_count(), 0);
}

#[tokio::test]
async fn test_cancel_build() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("cancel_build", json!({"buildId": BUILD_ID.to_string(), "comment": "stop"}))
        .await;
    assert_eq!(text, format!("Build #{} cancelled successfully", BUILD_NUMBER));

    let requests = server.upstream.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[1].method, "POST");
    assert_eq!(
        requests[1].path_and_query,
        format!("/app/rest/builds/id:{}/cancelRequest", BUILD_ID)
    );
}

#[tokio::test]
async fn test_trigger_build() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool(
            "trigger_build",
            json!({"buildTypeId": BUILD_TYPE_ID, "branchName": "main"}),
        )
        .await;
    assert_eq!(
        text,
        format!("Build #18 queued successfully (ID: {})", QUEUED_BUILD_ID)
    );
    assert_eq!(server.upstream.requests()[0].path_and_query, "/app/rest/buildQueue");
}

#[tokio::test]
async fn test_trigger_build_requires_build_type() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let error = client.call_tool_err("trigger_build", json!({})).await;
    assert_eq!(error["code"], -32603);
    assert!(data(&error).contains("buildTypeId is required"));
    assert_eq!(server.upstream.request_count(), 0);
}

#[tokio::test]
async fn test_pin_and_unpin_build() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let pinned = client
        .call_tool("pin_build", json!({"buildId": BUILD_ID, "pin": true}))
        .await;
    assert_eq!(pinned, format!("Build #{} pinned successfully", BUILD_NUMBER));

    let unpinned = client
        .call_tool("pin_build", json!({"buildId": BUILD_ID, "pin": false}))
        .await;
    assert_eq!(unpinned, format!("Build #{} unpinned successfully", BUILD_NUMBER));

    let methods: Vec<String> = server
        .upstream
        .requests()
        .into_iter()
        .map(|r| r.method)
        .collect();
    assert_eq!(methods, ["GET", "PUT", "GET", "DELETE"]);
}

#[tokio::test]
async fn test_set_build_tag_adds_then_removes() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool(
            "set_build_tag",
            json!({"buildId": BUILD_ID, "tags": ["release", "nightly"], "removeTags": ["needs review"]}),
        )
        .await;
    assert_eq!(text, format!("Tags updated for build #{}", BUILD_NUMBER));

    let calls: Vec<String> = server
        .upstream
        .requests()
        .into_iter()
        .map(|r| format!("{} {}", r.method, r.path_and_query))
        .collect();
    assert_eq!(
        calls,
        [
            format!("GET /app/rest/builds/id:{}", BUILD_ID),
            format!("POST /app/rest/builds/id:{}/tags", BUILD_ID),
            format!("POST /app/rest/builds/id:{}/tags", BUILD_ID),
            format!("DELETE /app/rest/builds/id:{}/tags/needs%20review", BUILD_ID),
        ]
    );
}

#[tokio::test]
async fn test_set_build_tag_stops_at_first_failure() {
    let server = TestServer::spawn().await;
    server
        .upstream
        .stub(&format!("/app/rest/builds/id:{}/tags", BUILD_ID), 403, "forbidden");
    let client = TestClient::new(server.base_url.clone());

    let error = client
        .call_tool_err(
            "set_build_tag",
            json!({"buildId": BUILD_ID, "tags": ["a", "b"]}),
        )
        .await;
    assert_eq!(error["code"], -32603);
    assert!(data(&error).contains("failed to add tag a"), "{}", error);
    // The build lookup plus the single failed add.
    assert_eq!(server.upstream.request_count(), 2);
}

#[tokio::test]
async fn test_download_artifact_confirms_without_upstream_call() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool(
            "download_artifact",
            json!({"buildId": BUILD_ID, "artifactPath": "dist/app.zip"}),
        )
        .await;
    assert_eq!(
        text,
        format!("Artifact dist/app.zip from build {} download initiated", BUILD_ID)
    );
    assert_eq!(server.upstream.request_count(), 0);

    let error = client
        .call_tool_err("download_artifact", json!({"buildId": BUILD_ID}))
        .await;
    assert!(data(&error).contains("artifactPath is required"));
}

#[tokio::test]
async fn test_search_builds_without_filters_uses_default_count() {
    let server = TestServer::spawn().await;
    server
        .upstream
        .stub("/app/rest/builds", 200, r#"{"count":0,"build":[]}"#);
    let client = TestClient::new(server.base_url.clone());

    let text = client.call_tool("search_builds", json!({})).await;
    assert_eq!(text, "No builds found matching the specified criteria.");

    let requests = server.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path_and_query, "/app/rest/builds?locator=count:100");
}

#[tokio::test]
async fn test_search_builds_renders_matches() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("search_builds", json!({"status": "SUCCESS", "count": 5}))
        .await;
    assert!(text.starts_with("Found 1 builds:"), "{}", text);
    assert!(text.contains(&format!("Build #{} (ID: {})", BUILD_NUMBER, BUILD_ID)));
    assert!(text.contains("Branch: main"));
    assert!(text.contains("Build Time: 15m\n"), "{}", text);

    let query = &server.upstream.requests()[0].path_and_query;
    assert!(query.contains("status:SUCCESS"), "{}", query);
    assert!(query.contains("count:5"), "{}", query);
}

#[tokio::test]
async fn test_fetch_build_log_with_severity_filter() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool(
            "fetch_build_log",
            json!({"buildId": BUILD_ID, "severity": "error"}),
        )
        .await;
    assert_eq!(
        text,
        format!(
            "Build log for build {}\nTotal lines: 5, Filtered lines: 1, Showing: 1 lines\n\n[10:00:05] ERROR: cannot find symbol Foo",
            BUILD_ID
        )
    );
    assert_eq!(
        server.upstream.requests()[0].path_and_query,
        format!("/downloadBuildLog.html?buildId={}&plain=true", BUILD_ID)
    );
}

#[tokio::test]
async fn test_fetch_build_log_info_severity_excludes_problems() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool(
            "fetch_build_log",
            json!({"buildId": BUILD_ID, "severity": "info"}),
        )
        .await;
    let body = text.split("\n\n").nth(1).unwrap_or_default();
    assert!(body.contains("Build finished"), "{}", text);
    for line in body.lines() {
        let lower = line.to_lowercase();
        assert!(!lower.contains("error") && !lower.contains("warn"), "{}", line);
    }
}

#[tokio::test]
async fn test_get_current_time() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("get_current_time", json!({"format": "date", "timezone": "UTC"}))
        .await;
    assert!(text.starts_with("Current time: "), "{}", text);
    assert!(text.contains("Timezone: UTC"), "{}", text);
    assert_eq!(server.upstream.request_count(), 0);
}

#[tokio::test]
async fn test_unknown_tool() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let error = client.call_tool_err("delete_everything", json!({})).await;
    assert_eq!(error["code"], -32603);
    assert_eq!(data(&error), "unknown tool: delete_everything");
}

#[tokio::test]
async fn test_upstream_error_is_reported() {
    let server = TestServer::spawn().await;
    server.upstream.stub("/app/rest/projects", 500, "boom");
    let client = TestClient::new(server.base_url.clone());

    let error = client.call_tool_err("get_projects", json!({})).await;
    assert_eq!(error["code"], -32603);
    assert!(data(&error).contains("API error 500: boom"), "{}", error);
}

#[tokio::test]
async fn test_resources_list_null_uri_returns_catalog() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let result = client.rpc_ok("resources/list", json!({"uri": null})).await;
    assert!(!result["resources"].as_array().unwrap().is_empty());
    assert_eq!(server.upstream.request_count(), 0);
}

// ============================================================================
// Build configurations and tests
// ============================================================================

fn detail_paths(build_type_id: &str) -> Vec<String> {
    let base = format!("/app/rest/buildTypes/id:{}", build_type_id);
    vec![
        format!(
            "{}?fields=id,name,projectName,projectId,href,webUrl,enabled,paused,template",
            base
        ),
        format!("{}/parameters", base),
        format!("{}/steps", base),
        format!("{}/vcs-root-entries", base),
    ]
}

#[tokio::test]
async fn test_search_build_configurations_fetches_details_in_order() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("search_build_configurations", json!({"includeDetails": true}))
        .await;
    assert!(text.starts_with("Found 1 build configurations:\n\n"), "{}", text);
    assert!(
        text.contains(
            "Configuration: Build (Gateway_Build)\n  Project: Gateway (Gateway)\n  \
             Parameters:\n    env.JAVA_HOME = /opt/jdk17\n  \
             Build Steps:\n    1. Compile [Maven2]\n  \
             VCS Roots:\n    gateway.git (jetbrains.git)\n"
        ),
        "{}",
        text
    );

    let paths: Vec<String> = server
        .upstream
        .requests()
        .into_iter()
        .map(|r| r.path_and_query)
        .collect();
    let mut expected = vec!["/app/rest/buildTypes?locator=count:100".to_string()];
    expected.extend(detail_paths(BUILD_TYPE_ID));
    assert_eq!(paths, expected);
}

#[tokio::test]
async fn test_search_build_configurations_skips_failed_details() {
    let server = TestServer::spawn().await;
    server.upstream.stub(
        "/app/rest/buildTypes",
        200,
        json!({
            "count": 2,
            "buildType": [
                {"id": "Gateway_Deploy", "name": "Deploy", "projectId": PROJECT_ID},
                {"id": BUILD_TYPE_ID, "name": "Build", "projectId": PROJECT_ID}
            ]
        })
        .to_string(),
    );
    server
        .upstream
        .stub("/app/rest/buildTypes/id:Gateway_Deploy", 500, "boom");
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool(
            "search_build_configurations",
            json!({"parameterName": "java_home"}),
        )
        .await;
    assert!(text.starts_with("Found 1 build configurations:"), "{}", text);
    assert!(text.contains("Configuration: Build (Gateway_Build)"), "{}", text);
    assert!(!text.contains("Gateway_Deploy"), "{}", text);
    // The failed configuration costs one call, the other one all four.
    assert_eq!(server.upstream.request_count(), 6);
}

#[tokio::test]
async fn test_search_build_configurations_detail_filter_excludes() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("search_build_configurations", json!({"stepType": "gradle"}))
        .await;
    assert_eq!(
        text,
        "No build configurations found matching the specified criteria."
    );
    assert_eq!(server.upstream.request_count(), 5);
}

#[tokio::test]
async fn test_get_build_types_by_id() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("get_build_types", json!({"id": BUILD_TYPE_ID}))
        .await;
    assert!(
        text.starts_with("Build Configuration: Build (Gateway_Build)\n  Project: Gateway (Gateway)\n"),
        "{}",
        text
    );

    let requests = server.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].path_and_query,
        format!("/app/rest/buildTypes/id:{}", BUILD_TYPE_ID)
    );
}

#[tokio::test]
async fn test_get_test_results_request() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("get_test_results", json!({"buildId": BUILD_ID, "count": 10}))
        .await;
    assert!(text.starts_with("Found 1 test results:\n"), "{}", text);
    assert!(text.contains("- GatewayTest.rejectsBadToken [FAILURE] (duration: 120 ms)"));
    assert_eq!(
        server.upstream.requests()[0].path_and_query,
        format!(
            "/app/rest/testOccurrences?locator=build:(id:{}),count:10\
             &fields=count,testOccurrence(id,name,status,duration,href)",
            BUILD_ID
        )
    );
}

#[tokio::test]
async fn test_get_test_failures_requests_failures_with_details() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let text = client
        .call_tool("get_test_failures", json!({"buildId": BUILD_ID.to_string()}))
        .await;
    assert_eq!(
        text.trim_end(),
        "1 failing tests:\n- GatewayTest.rejectsBadToken (duration: 120 ms): expected 401 but was 200"
    );

    let requests = server.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].path_and_query,
        format!(
            "/app/rest/testOccurrences?locator=build:(id:{}),status:FAILURE,count:100\
             &fields=count,testOccurrence(id,name,status,duration,href,details)",
            BUILD_ID
        )
    );
}
