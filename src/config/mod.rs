mod duration;
mod file_config;

pub use duration::{parse_duration, DurationParseError};
pub use file_config::{CacheFileConfig, FileConfig, TeamCityFileConfig};

use crate::server::RequestsLoggingLevel;
use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = ":8123";
pub const DEFAULT_TIMEOUT: &str = "30s";
pub const DEFAULT_CACHE_TTL: &str = "10s";

/// Help text printed by `--env-help`.
pub const ENV_HELP: &str = "\
Environment variables:
  TC_URL                  TeamCity server URL (required)
  TC_TOKEN                TeamCity API token
  TC_USERNAME             TeamCity username (basic auth, used when TC_TOKEN is unset)
  TC_PASSWORD             TeamCity password (basic auth)
  TC_TIMEOUT              Upstream request timeout (default: 30s)
  LISTEN_ADDR             HTTP listen address (default: :8123)
  SERVER_SECRET           Shared secret enabling bearer auth on /mcp
  LOG_LEVEL               Log filter: debug, info, warn, error (default: info)
  LOG_FORMAT              Log format: json or console (default: json)
  CACHE_TTL               Resource cache TTL (default: 10s)
  REQUESTS_LOGGING_LEVEL  HTTP request logging: none, path, headers, body (default: path)
";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TC_URL environment variable is required")]
    MissingUrl,
    #[error("either TC_TOKEN or TC_USERNAME and TC_PASSWORD must be set")]
    MissingCredentials,
    #[error("invalid {name}: {source}")]
    InvalidDuration {
        name: &'static str,
        #[source]
        source: DurationParseError,
    },
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("invalid requests logging level: {0}")]
    InvalidRequestsLoggingLevel(String),
}

/// Raw values read from the process environment, before validation.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub tc_url: Option<String>,
    pub tc_token: Option<String>,
    pub tc_username: Option<String>,
    pub tc_password: Option<String>,
    pub tc_timeout: Option<String>,
    pub listen_addr: Option<String>,
    pub server_secret: Option<String>,
    pub cache_ttl: Option<String>,
    pub requests_logging_level: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            tc_url: get("TC_URL"),
            tc_token: get("TC_TOKEN"),
            tc_username: get("TC_USERNAME"),
            tc_password: get("TC_PASSWORD"),
            tc_timeout: get("TC_TIMEOUT"),
            listen_addr: get("LISTEN_ADDR"),
            server_secret: get("SERVER_SECRET"),
            cache_ttl: get("CACHE_TTL"),
            requests_logging_level: get("REQUESTS_LOGGING_LEVEL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamAuth {
    Bearer(String),
    Basic { username: String, password: String },
}

#[derive(Debug, Clone)]
pub struct TeamCitySettings {
    pub url: String,
    pub auth: UpstreamAuth,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub teamcity: TeamCitySettings,
    pub listen_addr: String,
    pub server_secret: Option<String>,
    pub cache_ttl: Duration,
    pub requests_logging_level: RequestsLoggingLevel,
}

impl AppConfig {
    /// Resolve configuration from the environment and an optional TOML file.
    /// TOML values override environment values where present.
    pub fn resolve(env: &EnvConfig, file_config: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file_config.unwrap_or_default();
        let tc_file = file.teamcity.unwrap_or_default();
        let cache_file = file.cache.unwrap_or_default();

        let url = tc_file
            .url
            .or_else(|| env.tc_url.clone())
            .ok_or(ConfigError::MissingUrl)?
            .trim_end_matches('/')
            .to_string();

        let token = tc_file.token.or_else(|| env.tc_token.clone());
        let username = tc_file.username.or_else(|| env.tc_username.clone());
        let password = tc_file.password.or_else(|| env.tc_password.clone());
        let auth = match (token, username, password) {
            (Some(token), _, _) => UpstreamAuth::Bearer(token),
            (None, Some(username), Some(password)) => UpstreamAuth::Basic { username, password },
            _ => return Err(ConfigError::MissingCredentials),
        };

        let timeout = resolve_duration(
            "TC_TIMEOUT",
            tc_file.timeout.or_else(|| env.tc_timeout.clone()),
            DEFAULT_TIMEOUT,
        )?;
        let cache_ttl = resolve_duration(
            "CACHE_TTL",
            cache_file.ttl.or_else(|| env.cache_ttl.clone()),
            DEFAULT_CACHE_TTL,
        )?;

        let listen_addr = file
            .listen_addr
            .or_else(|| env.listen_addr.clone())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let server_secret = file
            .server_secret
            .or_else(|| env.server_secret.clone())
            .filter(|s| !s.is_empty());

        let requests_logging_level = match file
            .requests_logging_level
            .or_else(|| env.requests_logging_level.clone())
        {
            Some(raw) => parse_logging_level(&raw)
                .ok_or(ConfigError::InvalidRequestsLoggingLevel(raw))?,
            None => RequestsLoggingLevel::default(),
        };

        Ok(Self {
            teamcity: TeamCitySettings { url, auth, timeout },
            listen_addr,
            server_secret,
            cache_ttl,
            requests_logging_level,
        })
    }

    /// Address suitable for `TcpListener::bind`. A bare `:port` binds every interface.
    pub fn bind_addr(&self) -> String {
        if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        }
    }
}

fn resolve_duration(
    name: &'static str,
    raw: Option<String>,
    default: &str,
) -> Result<Duration, ConfigError> {
    let raw = raw.unwrap_or_else(|| default.to_string());
    let value =
        parse_duration(&raw).map_err(|source| ConfigError::InvalidDuration { name, source })?;
    if value.is_zero() {
        return Err(ConfigError::ZeroDuration(name));
    }
    Ok(value)
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
