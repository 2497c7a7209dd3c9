//! Client configuration.

use crate::error::ApiError;
use std::time::Duration;

/// Environment variable holding the backend base URL.
pub const API_URL_VAR: &str = "CERTCANVAS_API_URL";

/// Optional request timeout override, in seconds.
pub const API_TIMEOUT_VAR: &str = "CERTCANVAS_API_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("certcanvas/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Read [`API_URL_VAR`] and [`API_TIMEOUT_VAR`] from the environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let base_url = lookup(API_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{API_URL_VAR} is not set")))?;
        let mut config = Self::new(base_url.trim());

        if let Some(raw) = lookup(API_TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::Config(format!("{API_TIMEOUT_VAR} must be a whole number, got {raw:?}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path such as `/certificate/abc`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
