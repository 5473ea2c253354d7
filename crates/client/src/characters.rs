//! Character persistence endpoints.

use serde::Deserialize;

use chronicler_rules::{Character, CharacterId, LevelUpInfo, LevelUpRequest};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::payload::{CharacterPayload, CharacterRecord};

#[derive(Debug, Deserialize)]
struct AvatarResponse {
    path: String,
}

impl ApiClient {
    /// Persist a new character; the backend assigns the id.
    pub async fn create_character(&self, character: &Character) -> Result<Character, ApiError> {
        let payload = CharacterPayload::from_character(character);
        let record: CharacterRecord = self.post_json("/api/character", &payload).await?;
        Ok(record.into_character())
    }

    /// Update an existing character in place.
    pub async fn update_character(&self, character: &Character) -> Result<Character, ApiError> {
        let id = character.id.ok_or(ApiError::MissingId("character"))?;
        let payload = CharacterPayload::from_character(character);
        let record: CharacterRecord = self
            .put_json(&format!("/api/character/{}", id), &payload)
            .await?;
        Ok(record.into_character())
    }

    pub async fn get_character(&self, id: CharacterId) -> Result<Character, ApiError> {
        let record: CharacterRecord = self.get_json(&format!("/api/character/{}", id)).await?;
        Ok(record.into_character())
    }

    /// Fetch the level-up choices the backend computed for this character.
    pub async fn level_up_info(&self, id: CharacterId) -> Result<LevelUpInfo, ApiError> {
        self.get_json(&format!("/api/character/level-up-info/{}", id))
            .await
    }

    /// Submit the chosen HP method, ASI distribution, subclass, and spells.
    pub async fn level_up(
        &self,
        id: CharacterId,
        request: &LevelUpRequest,
    ) -> Result<Character, ApiError> {
        let record: CharacterRecord = self
            .post_json(&format!("/api/character/level-up/{}", id), request)
            .await?;
        Ok(record.into_character())
    }

    /// Rest, restoring a fraction of missing HP. The backend owns the
    /// recovery formula; the returned record is canonical.
    pub async fn rest(&self, id: CharacterId) -> Result<Character, ApiError> {
        let record: CharacterRecord = self
            .post_json(&format!("/api/character/rest/{}", id), &serde_json::json!({}))
            .await?;
        Ok(record.into_character())
    }

    /// Upload an avatar image, returning the stored path.
    pub async fn upload_avatar(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ApiError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("avatar", part);
        let response: AvatarResponse = self.post_multipart("/api/upload/avatar", form).await?;
        Ok(response.path)
    }
}
