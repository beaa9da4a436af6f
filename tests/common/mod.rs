//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_ping() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let result = client.rpc_ok("ping", json!({})).await;
//!     assert_eq!(result, json!({}));
//! }
//! ```

#![allow(dead_code)]

mod client;
mod constants;
mod server;
mod upstream;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;
pub use upstream::{MockTeamCity, RecordedRequest};
