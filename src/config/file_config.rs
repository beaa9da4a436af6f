use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML overlay. Every field overrides the matching environment value.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub listen_addr: Option<String>,
    pub server_secret: Option<String>,
    pub requests_logging_level: Option<String>,

    pub teamcity: Option<TeamCityFileConfig>,
    pub cache: Option<CacheFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TeamCityFileConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Go-style duration, e.g. "30s"
    pub timeout: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CacheFileConfig {
    pub ttl: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
