//! HTTP plumbing shared by every backend call.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::correlation::CorrelationId;
use crate::error::ApiError;

/// Header carrying the per-request correlation id.
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

/// Client for the persistence and generation backend.
///
/// Calls are plain request/response with no retry or backoff: a failure is
/// returned once and the caller's state is untouched.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    /// Create a client from environment variables (see [`ApiConfig::from_env`]).
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let correlation = CorrelationId::new();
        debug!(correlation = %correlation.short(), path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .header(CORRELATION_HEADER, correlation.to_string())
            .send()
            .await?;
        Self::decode(correlation, response).await
    }

    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let correlation = CorrelationId::new();
        debug!(correlation = %correlation.short(), path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .header(CORRELATION_HEADER, correlation.to_string())
            .json(body)
            .send()
            .await?;
        Self::decode(correlation, response).await
    }

    pub(crate) async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let correlation = CorrelationId::new();
        debug!(correlation = %correlation.short(), path, "PUT");
        let response = self
            .client
            .put(self.url(path))
            .header(CORRELATION_HEADER, correlation.to_string())
            .json(body)
            .send()
            .await?;
        Self::decode(correlation, response).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let correlation = CorrelationId::new();
        debug!(correlation = %correlation.short(), path, "POST multipart");
        let response = self
            .client
            .post(self.url(path))
            .header(CORRELATION_HEADER, correlation.to_string())
            .multipart(form)
            .send()
            .await?;
        Self::decode(correlation, response).await
    }

    async fn decode<T: DeserializeOwned>(
        correlation: CorrelationId,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(correlation = %correlation.short(), status = status.as_u16(), "Backend error");
            return Err(ApiError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_paths() {
        let client = ApiClient::new(ApiConfig::new("http://localhost:3001/"));
        assert_eq!(
            client.url("/api/character"),
            "http://localhost:3001/api/character"
        );
        assert_eq!(
            client.url("api/character"),
            "http://localhost:3001/api/character"
        );
    }
}
