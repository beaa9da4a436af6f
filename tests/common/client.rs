//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with helpers for JSON-RPC over `POST /mcp`.
//!
//! When the MCP envelope or routes change, update only this file.

use super::constants::*;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    token: Option<String>,
    next_id: AtomicI64,
}

impl TestClient {
    /// Creates a client that sends no Authorization header
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: None,
            next_id: AtomicI64::new(1),
        }
    }

    /// Creates a client that presents `Bearer {token}` on every request
    pub fn with_token(base_url: String, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(base_url)
        }
    }

    // ========================================================================
    // Raw Requests
    // ========================================================================

    /// POST a raw body to `/mcp`
    pub async fn post_mcp_raw(&self, body: impl Into<String>) -> Response {
        let mut request = self
            .client
            .post(format!("{}/mcp", self.base_url))
            .header("content-type", "application/json")
            .body(body.into());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("POST /mcp failed")
    }

    pub async fn get(&self, path: &str) -> Response {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("GET request failed")
    }

    // ========================================================================
    // JSON-RPC
    // ========================================================================

    /// Sends a request with a fresh id and returns the full response envelope.
    ///
    /// # Panics
    ///
    /// Panics unless the gateway answers 200 with a JSON body echoing the id.
    pub async fn rpc(&self, method: &str, params: Value) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.post_mcp_raw(envelope.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK, "{} failed", method);
        let body: Value = response.json().await.expect("Response is not JSON");
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], id);
        body
    }

    /// `result` of a successful call
    pub async fn rpc_ok(&self, method: &str, params: Value) -> Value {
        let body = self.rpc(method, params).await;
        assert!(body.get("error").is_none(), "{} errored: {}", method, body);
        body["result"].clone()
    }

    /// `error` of a failed call
    pub async fn rpc_err(&self, method: &str, params: Value) -> Value {
        let body = self.rpc(method, params).await;
        assert!(body.get("result").is_none(), "{} succeeded: {}", method, body);
        body["error"].clone()
    }

    /// Calls a tool and returns the text of its single content block.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> String {
        let result = self
            .rpc_ok("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        let content = result["content"].as_array().expect("content is not an array");
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
        content[0]["text"].as_str().unwrap_or_default().to_string()
    }

    /// Calls a tool that is expected to fail and returns the JSON-RPC error.
    pub async fn call_tool_err(&self, name: &str, arguments: Value) -> Value {
        self.rpc_err("tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }
}
