use super::RequestsLoggingLevel;
use crate::config::{AppConfig, DEFAULT_LISTEN_ADDR};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub listen_addr: String,
    /// When set, `/mcp` requires `Authorization: Bearer <hmac>`.
    pub server_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            server_secret: None,
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.requests_logging_level.clone(),
            listen_addr: config.bind_addr(),
            server_secret: config.server_secret.clone(),
        }
    }
}
