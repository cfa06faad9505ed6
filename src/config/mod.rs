//! Configuration for the connector cache and its CATMAID client.

mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::time::Duration;

/// Default time-to-live for cached per-skeleton data, in seconds.
pub const DEFAULT_CACHE_TIMEOUT_SECS: u64 = 5 * 60;

/// Default HTTP request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Resolved settings for the cache and its client.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Base URL of the CATMAID server.
    pub base_url: String,
    /// Project whose skeletons are queried.
    pub project_id: i64,
    /// Optional API token for authenticated servers.
    pub api_token: Option<String>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Seconds before cached per-skeleton data is considered stale.
    pub cache_timeout_secs: u64,
}

impl CacheSettings {
    /// Create settings with default timeouts and no API token.
    pub fn new(base_url: impl Into<String>, project_id: i64) -> Self {
        Self {
            base_url: base_url.into(),
            project_id,
            api_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_timeout_secs: DEFAULT_CACHE_TIMEOUT_SECS,
        }
    }

    /// Resolve settings from programmatic values and an optional TOML file
    /// config. File values override programmatic values where present.
    pub fn resolve(base: &CacheSettings, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let base_url = file.base_url.unwrap_or_else(|| base.base_url.clone());
        if base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }

        let project_id = file.project_id.unwrap_or(base.project_id);
        if project_id < 0 {
            bail!("project_id must not be negative: {}", project_id);
        }

        let api_token = file.api_token.or_else(|| base.api_token.clone());
        let request_timeout_secs = file
            .request_timeout_secs
            .unwrap_or(base.request_timeout_secs);
        let cache_timeout_secs = file.cache_timeout_secs.unwrap_or(base.cache_timeout_secs);

        Ok(Self {
            base_url,
            project_id,
            api_token,
            request_timeout_secs,
            cache_timeout_secs,
        })
    }

    /// Time-to-live for cached per-skeleton data.
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_secs(self.cache_timeout_secs)
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
