//! Mock TeamCity REST server
//!
//! Serves canned JSON for the handful of endpoints the gateway touches and
//! records every request it receives, so tests can assert on upstream traffic
//! (or the lack of it).

use super::constants::*;
use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A request as seen by the mock, e.g. `GET /app/rest/builds?locator=count:100`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path_and_query: String,
    pub authorization: Option<String>,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    stubs: Arc<Mutex<HashMap<String, (u16, String)>>>,
}

/// Running mock upstream. Stops when dropped.
pub struct MockTeamCity {
    pub base_url: String,
    state: MockState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockTeamCity {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream");
        let port = listener
            .local_addr()
            .expect("Failed to get mock upstream address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Mock upstream failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Replace the response for `path` (no query string) with a fixed one.
    pub fn stub(&self, path: &str, status: u16, body: impl Into<String>) {
        self.state
            .stubs
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().unwrap().clear();
    }
}

impl Drop for MockTeamCity {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn respond(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: axum::http::HeaderMap,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path_and_query,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let stub = state.stubs.lock().unwrap().get(uri.path()).cloned();
    if let Some((status, body)) = stub {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, [(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    match canned(&method, uri.path()) {
        Some(Canned::Json(value)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            value.to_string(),
        )
            .into_response(),
        Some(Canned::Text(text)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            text,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

enum Canned {
    Json(Value),
    Text(&'static str),
}

fn build() -> Value {
    json!({
        "id": BUILD_ID,
        "number": BUILD_NUMBER,
        "status": "SUCCESS",
        "state": "finished",
        "branchName": "main",
        "buildTypeId": BUILD_TYPE_ID,
        "queuedDate": "20240115T100000+0000",
        "startDate": "20240115T100030+0000",
        "finishDate": "20240115T101530+0000",
        "buildType": {"id": BUILD_TYPE_ID, "name": "Build"}
    })
}

fn build_type() -> Value {
    json!({
        "id": BUILD_TYPE_ID,
        "name": "Build",
        "projectId": PROJECT_ID,
        "projectName": "Gateway",
        "webUrl": "http://teamcity.local/viewType.html?buildTypeId=Gateway_Build"
    })
}

fn canned(method: &Method, path: &str) -> Option<Canned> {
    let build_path = format!("/app/rest/builds/id:{}", BUILD_ID);
    let build_type_path = format!("/app/rest/buildTypes/id:{}", BUILD_TYPE_ID);

    let canned = match (method.as_str(), path) {
        ("GET", "/app/rest/projects") => Canned::Json(json!({
            "count": 2,
            "project": [
                {"id": "_Root", "name": "<Root project>"},
                {"id": PROJECT_ID, "name": "Gateway", "parentProjectId": "_Root"}
            ]
        })),
        ("GET", "/app/rest/buildTypes") => Canned::Json(json!({
            "count": 1,
            "buildType": [build_type()]
        })),
        ("GET", p) if p == build_type_path => Canned::Json(build_type()),
        ("GET", p) if p == format!("{}/parameters", build_type_path) => Canned::Json(json!({
            "property": [{"name": "env.JAVA_HOME", "value": "/opt/jdk17"}]
        })),
        ("GET", p) if p == format!("{}/steps", build_type_path) => Canned::Json(json!({
            "step": [{"id": "RUNNER_1", "name": "Compile", "type": "Maven2"}]
        })),
        ("GET", p) if p == format!("{}/vcs-root-entries", build_type_path) => Canned::Json(json!({
            "vcs-root-entry": [
                {"vcs-root": {"id": "Gateway_Git", "name": "gateway.git", "vcsName": "jetbrains.git"}}
            ]
        })),
        ("GET", "/app/rest/testOccurrences") => Canned::Json(json!({
            "count": 1,
            "testOccurrence": [{
                "id": "build:(id:42),id:2000",
                "name": "GatewayTest.rejectsBadToken",
                "status": "FAILURE",
                "duration": 120,
                "details": "expected 401 but was 200"
            }]
        })),
        ("GET", "/app/rest/builds") => Canned::Json(json!({"count": 1, "build": [build()]})),
        ("GET", "/app/rest/agents") => Canned::Json(json!({
            "count": 1,
            "agent": [{"id": 1, "name": AGENT_NAME, "connected": true, "enabled": true}]
        })),
        ("POST", "/app/rest/buildQueue") => Canned::Json(json!({
            "id": QUEUED_BUILD_ID,
            "number": "18",
            "state": "queued",
            "buildTypeId": BUILD_TYPE_ID
        })),
        ("GET", "/downloadBuildLog.html") => Canned::Text(
            "[10:00:01] Step 1/2: Compile\n[10:00:05] ERROR: cannot find symbol Foo\n[10:00:06] WARNING: deprecated API\n[10:00:09] Build finished\n",
        ),
        ("GET", p) if p == build_path => Canned::Json(build()),
        ("POST", p) if p == format!("{}/cancelRequest", build_path) => Canned::Json(build()),
        ("PUT", p) | ("DELETE", p) if p == format!("{}/pin", build_path) => Canned::Text(""),
        ("POST", p) if p == format!("{}/tags", build_path) => Canned::Text(""),
        ("DELETE", p) if p.starts_with(&format!("{}/tags/", build_path)) => Canned::Text(""),
        _ => return None,
    };
    Some(canned)
}
