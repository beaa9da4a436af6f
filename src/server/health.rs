//! Liveness and readiness endpoints. Both bypass authentication.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::warn;

use super::state::GuardedReadinessProbe;

const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": timestamp(),
        "service": crate::SERVER_NAME,
    }))
}

/// Ready when TeamCity answers a minimal project listing within five seconds.
pub async fn readyz(State(probe): State<GuardedReadinessProbe>) -> impl IntoResponse {
    let outcome = match tokio::time::timeout(READINESS_TIMEOUT, probe.check()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!(
            "readiness check timed out after {}s",
            READINESS_TIMEOUT.as_secs()
        )),
    };

    match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": timestamp(),
                "checks": {
                    "teamcity": {"status": "ok"}
                }
            })),
        ),
        Err(error) => {
            warn!("Readiness check failed: {}", error);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "timestamp": timestamp(),
                    "checks": {
                        "teamcity": {"status": "error", "error": error}
                    }
                })),
            )
        }
    }
}
