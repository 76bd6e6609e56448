//! Runner configuration
//!
//! The base URL and admin key arrive as an explicit struct passed into the
//! runner, not module-level state, so runs against different environments
//! can coexist in one process.

use crate::error::RunnerError;
use apicycle_http::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Environment variable carrying the API base URL
pub const ENV_BASE_URL: &str = "APICYCLE_API_BASE_URL";
/// Environment variable carrying the admin API key
pub const ENV_API_KEY: &str = "APICYCLE_ADMIN_API_KEY";

/// Lifecycle runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// API base URL, e.g. `https://api.example.test/v1`
    pub base_url: String,
    /// Admin API key forwarded as `x-api-key` by the production transport
    pub api_key: Option<String>,
    /// Retry behavior for every request the runner issues
    #[serde(skip, default)]
    pub retry: RetryPolicy,
}

impl RunnerConfig {
    /// Configuration with default retry policy and no API key
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            retry: RetryPolicy::default(),
        }
    }

    /// With an admin API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// With a custom retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Read base URL and admin key from the environment
    pub fn from_env() -> Result<Self, RunnerError> {
        let base_url = std::env::var(ENV_BASE_URL)
            .map_err(|_| RunnerError::Config(format!("{ENV_BASE_URL} is not set")))?;
        let api_key = std::env::var(ENV_API_KEY).ok();
        Ok(Self {
            base_url,
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    /// Join a resolved operation path onto the base URL
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}
