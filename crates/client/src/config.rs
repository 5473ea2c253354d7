//! Backend connection configuration.

use std::time::Duration;

/// Default backend base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the backend API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read configuration from the environment.
    ///
    /// Loads `.env` if present, then uses `CHRONICLER_API_URL` and
    /// `CHRONICLER_API_TIMEOUT_SECS`, falling back to defaults when unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("CHRONICLER_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let timeout_secs = std::env::var("CHRONICLER_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(&base_url).with_timeout(Duration::from_secs(timeout_secs))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
