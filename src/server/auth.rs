//! Shared-secret bearer authentication for the MCP endpoint.
//!
//! The expected token is `hex(HMAC-SHA256(secret, "teamcity-mcp"))`.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use super::ServerConfig;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_MESSAGE: &[u8] = b"teamcity-mcp";

fn keyed_mac(secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(TOKEN_MESSAGE);
    Some(mac)
}

/// The bearer token clients must present for `secret`.
pub fn expected_token(secret: &str) -> String {
    keyed_mac(secret)
        .map(|mac| {
            mac.finalize()
                .into_bytes()
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect()
        })
        .unwrap_or_default()
}

/// Constant-time check of a presented token against `secret`.
pub fn validate_token(secret: &str, token: &str) -> bool {
    match (decode_hex(token), keyed_mac(secret)) {
        (Some(bytes), Some(mac)) => mac.verify_slice(&bytes).is_ok(),
        _ => false,
    }
}

/// Lowercase hex only, matching the form `expected_token` produces.
fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

fn unauthorized(message: &'static str) -> Response {
    (StatusCode::UNAUTHORIZED, format!("{}\n", message)).into_response()
}

/// Rejects requests without a valid bearer token. A no-op when no secret is
/// configured.
pub async fn require_bearer(
    State(config): State<ServerConfig>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let secret = match &config.server_secret {
        Some(secret) => secret,
        None => return next.run(request).await,
    };

    let header_value = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => value.to_str().unwrap_or_default(),
        None => return unauthorized("Authorization header required"),
    };
    if header_value.is_empty() {
        return unauthorized("Authorization header required");
    }

    let token = match header_value.strip_prefix("Bearer ") {
        Some(token) => token,
        None => return unauthorized("Bearer token required"),
    };

    if !validate_token(secret, token) {
        debug!("Rejected request with invalid bearer token");
        return unauthorized("Invalid token");
    }

    next.run(request).await
}
