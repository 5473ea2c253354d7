//! AI content-generation endpoints.
//!
//! The generator is an opaque collaborator: request bodies are shaped by
//! the caller and responses are returned as raw JSON for rendering. No
//! schema is imposed on either side.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::ApiClient;

/// Port for AI content generation, so flows can be tested against a stub
/// instead of a live generator.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate a quest of the given kind (e.g. "side", "main").
    async fn generate_quest(&self, kind: &str, request: &Value) -> Result<Value, ApiError>;

    /// Generate a location description.
    async fn generate_location(&self, request: &Value) -> Result<Value, ApiError>;

    /// Generate a living-world event of the given kind.
    async fn generate_living_world(&self, kind: &str, request: &Value) -> Result<Value, ApiError>;
}

#[async_trait]
impl ContentGenerator for ApiClient {
    async fn generate_quest(&self, kind: &str, request: &Value) -> Result<Value, ApiError> {
        self.post_json(&format!("/api/quest/generate/{}", kind), request)
            .await
    }

    async fn generate_location(&self, request: &Value) -> Result<Value, ApiError> {
        self.post_json("/api/location/generate", request).await
    }

    async fn generate_living_world(&self, kind: &str, request: &Value) -> Result<Value, ApiError> {
        self.post_json(&format!("/api/living-world/generate/{}", kind), request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubGenerator;

    #[async_trait]
    impl ContentGenerator for StubGenerator {
        async fn generate_quest(&self, kind: &str, _request: &Value) -> Result<Value, ApiError> {
            Ok(json!({ "title": "The Missing Caravan", "kind": kind }))
        }

        async fn generate_location(&self, _request: &Value) -> Result<Value, ApiError> {
            Ok(json!({ "name": "Duskhollow" }))
        }

        async fn generate_living_world(
            &self,
            _kind: &str,
            _request: &Value,
        ) -> Result<Value, ApiError> {
            Err(ApiError::Backend {
                status: 503,
                body: "generator offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn callers_depend_on_the_port_not_the_client() {
        let generator: &dyn ContentGenerator = &StubGenerator;

        let quest = generator
            .generate_quest("side", &json!({ "level": 3 }))
            .await
            .expect("quest");
        assert_eq!(quest["kind"], "side");

        let err = generator
            .generate_living_world("festival", &json!({}))
            .await
            .expect_err("offline generator");
        assert!(matches!(err, ApiError::Backend { status: 503, .. }));
    }
}
