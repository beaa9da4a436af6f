//! TeamCity MCP Gateway Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod cache;
pub mod config;
pub mod mcp;
pub mod server;
pub mod teamcity;

/// Name reported in `serverInfo` and the health endpoint
pub const SERVER_NAME: &str = "teamcity-mcp";

/// `{crate version}-{git hash}`, as reported to MCP clients
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

// Re-export commonly used types for convenience
pub use cache::TtlCache;
pub use config::AppConfig;
pub use mcp::McpDispatcher;
pub use server::{run_server, RequestsLoggingLevel, ServerConfig, ServerState};
pub use teamcity::TeamCityClient;
