//! Companion persistence endpoints.

use chronicler_rules::{CharacterId, Companion, CompanionId, LevelUpRequest};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::payload::{CompanionPayload, CompanionRecord};

impl ApiClient {
    pub async fn get_companion(&self, id: CompanionId) -> Result<Companion, ApiError> {
        let record: CompanionRecord = self.get_json(&format!("/api/companion/{}", id)).await?;
        Ok(record.into_companion())
    }

    /// Companions recruited by a character.
    pub async fn companions_for(
        &self,
        character: CharacterId,
    ) -> Result<Vec<Companion>, ApiError> {
        let records: Vec<CompanionRecord> = self
            .get_json(&format!("/api/companion/by-character/{}", character))
            .await?;
        Ok(records.into_iter().map(CompanionRecord::into_companion).collect())
    }

    /// Recruit a new companion.
    pub async fn recruit_companion(&self, companion: &Companion) -> Result<Companion, ApiError> {
        let payload = CompanionPayload::from_companion(companion);
        let record: CompanionRecord = self.post_json("/api/companion", &payload).await?;
        Ok(record.into_companion())
    }

    pub async fn update_companion(&self, companion: &Companion) -> Result<Companion, ApiError> {
        let id = companion.id.ok_or(ApiError::MissingId("companion"))?;
        let payload = CompanionPayload::from_companion(companion);
        let record: CompanionRecord = self
            .put_json(&format!("/api/companion/{}", id), &payload)
            .await?;
        Ok(record.into_companion())
    }

    /// Submit a level-up for a class-based companion.
    pub async fn level_up_companion(
        &self,
        id: CompanionId,
        request: &LevelUpRequest,
    ) -> Result<Companion, ApiError> {
        let record: CompanionRecord = self
            .post_json(&format!("/api/companion/level-up/{}", id), request)
            .await?;
        Ok(record.into_companion())
    }

    /// Persist a stat-block to class-based conversion. The conversion
    /// itself is computed locally (see the rules crate); this stores the
    /// resulting record.
    pub async fn convert_companion(&self, companion: &Companion) -> Result<Companion, ApiError> {
        let id = companion.id.ok_or(ApiError::MissingId("companion"))?;
        let payload = CompanionPayload::from_companion(companion);
        let record: CompanionRecord = self
            .post_json(&format!("/api/companion/convert/{}", id), &payload)
            .await?;
        Ok(record.into_companion())
    }

    /// Ask the generation service for a companion backstory. The response
    /// shape is owned by the generator; it is rendered, not interpreted.
    pub async fn generate_companion_backstory(
        &self,
        id: CompanionId,
    ) -> Result<serde_json::Value, ApiError> {
        self.post_json(
            &format!("/api/companion/{}/backstory/generate", id),
            &serde_json::json!({}),
        )
        .await
    }
}
