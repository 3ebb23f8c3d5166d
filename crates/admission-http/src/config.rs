//! REST client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Connection settings for the admission REST API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// API root, without the `admissions/` segment
    pub base_url: String,
    /// Bearer token of the signed-in applicant
    pub token: Option<String>,
    /// Whole-request timeout
    pub timeout_secs: u64,
}

impl HttpConfig {
    /// Create config for base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout_secs: 30,
        }
    }
}
