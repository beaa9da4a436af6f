//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the canned TeamCity data changes, update only this file and
//! `upstream.rs`.

// ============================================================================
// Gateway Credentials
// ============================================================================

/// Shared secret the authenticated test server is started with
pub const TEST_SECRET: &str = "e2e-shared-secret";

/// Token the gateway presents to the mock TeamCity
pub const UPSTREAM_TOKEN: &str = "upstream-token";

// ============================================================================
// Canned TeamCity Data
// ============================================================================

/// Project served by the mock upstream
pub const PROJECT_ID: &str = "Gateway";

/// Build configuration inside [`PROJECT_ID`]
pub const BUILD_TYPE_ID: &str = "Gateway_Build";

/// The one finished build the mock upstream knows about
pub const BUILD_ID: i64 = 42;

/// Display number of [`BUILD_ID`]
pub const BUILD_NUMBER: &str = "17";

/// Id the mock assigns to newly queued builds
pub const QUEUED_BUILD_ID: i64 = 43;

/// Agent registered with the mock upstream
pub const AGENT_NAME: &str = "agent-linux-1";

/// Every tool name, in `tools/list` order
pub const TOOL_NAMES: [&str; 13] = [
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
];

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for a spawned server to accept requests
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Delay between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
