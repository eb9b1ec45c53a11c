//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client can start with zero
//! configuration.

use std::path::PathBuf;
use std::time::Duration;

use hushy_shared::constants::{
    DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS, LINK_PREVIEW_TIMEOUT_SECS,
};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Candidate backend base URLs, probed in order at startup.
    /// Env: `HUSHY_API_URLS` (comma-separated)
    /// Default: `https://api.hushy.app`
    pub api_urls: Vec<String>,

    /// Timeout for regular API requests.
    /// Env: `HUSHY_REQUEST_TIMEOUT_SECS`
    /// Default: 15 s
    pub request_timeout: Duration,

    /// Timeout of a single link-preview fetch attempt.
    /// Env: `HUSHY_PREVIEW_TIMEOUT_SECS`
    /// Default: 10 s
    pub preview_timeout: Duration,

    /// How long a candidate gets to answer the health probe.
    pub health_check_timeout: Duration,

    /// Location of the cache database.
    /// Env: `HUSHY_DB_PATH`
    /// Default: platform cache directory.
    pub db_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_urls: vec![DEFAULT_API_URL.to_string()],
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            preview_timeout: Duration::from_secs(LINK_PREVIEW_TIMEOUT_SECS),
            health_check_timeout: Duration::from_secs(3),
            db_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = var("HUSHY_API_URLS") {
            let urls = parse_url_list(&raw);
            if urls.is_empty() {
                tracing::warn!(value = %raw, "HUSHY_API_URLS has no usable entry, using default");
            } else {
                config.api_urls = urls;
            }
        }

        if let Some(secs) = parse_secs(&var, "HUSHY_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = secs;
        }

        if let Some(secs) = parse_secs(&var, "HUSHY_PREVIEW_TIMEOUT_SECS") {
            config.preview_timeout = secs;
        }

        if let Some(path) = var("HUSHY_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        config
    }
}

/// Split a comma-separated list, trimming entries and trailing slashes.
fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}

fn parse_secs(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<Duration> {
    let raw = var(name)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!(variable = name, value = %raw, "Invalid duration, using default");
            None
        }
    }
}
