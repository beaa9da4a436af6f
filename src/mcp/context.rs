//! MCP Tool Execution Context
//!
//! What tool and resource handlers get to work with.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::TtlCache;
use crate::teamcity::TeamCityClient;

/// Context provided to tool and resource handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// The only way out to TeamCity
    pub client: Arc<TeamCityClient>,

    /// Memoized resource payloads
    pub cache: Arc<TtlCache>,

    /// Fires when the caller goes away (connection closed, shutdown)
    pub cancel: CancellationToken,

    /// Server version reported in runtime info
    pub server_version: String,
}
