//! Admin-editable assistant settings, persisted as one JSON row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Storage;
use crate::config::{AssistantConfig, AssistantMode};
use crate::error::LawdeskError;

/// The part of [`AssistantConfig`] an admin may change at runtime.
///
/// Endpoints, API keys, history length and the rate limit stay with the
/// process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantSettings {
    pub mode: AssistantMode,
    pub glm_model: String,
    pub gemini_model: String,
    pub system_prompt: String,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl AssistantSettings {
    pub fn from_config(cfg: &AssistantConfig) -> Self {
        Self {
            mode: cfg.mode,
            glm_model: cfg.glm_model.clone(),
            gemini_model: cfg.gemini_model.clone(),
            system_prompt: cfg.system_prompt.clone(),
            timeout_secs: cfg.timeout_secs,
            max_retries: cfg.max_retries,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }

    pub fn apply_to(&self, cfg: &mut AssistantConfig) {
        cfg.mode = self.mode;
        cfg.glm_model.clone_from(&self.glm_model);
        cfg.gemini_model.clone_from(&self.gemini_model);
        cfg.system_prompt.clone_from(&self.system_prompt);
        cfg.timeout_secs = self.timeout_secs;
        cfg.max_retries = self.max_retries;
        cfg.temperature = self.temperature;
        cfg.top_p = self.top_p;
        cfg.max_tokens = self.max_tokens;
    }
}

impl Storage {
    /// Stored settings, if an admin ever saved any.
    pub async fn load_assistant_settings(&self) -> Result<Option<AssistantSettings>, LawdeskError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT settings FROM assistant_settings WHERE id = 1")
                .fetch_optional(self.pool())
                .await?;
        Ok(raw.and_then(|raw| {
            serde_json::from_str(&raw)
                .inspect_err(|e| warn!(error = %e, "ignoring unreadable assistant settings"))
                .ok()
        }))
    }

    pub async fn save_assistant_settings(
        &self,
        settings: &AssistantSettings,
    ) -> Result<(), LawdeskError> {
        sqlx::query(
            r#"INSERT INTO assistant_settings (id, settings, updated_at) VALUES (1, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 settings = excluded.settings,
                 updated_at = excluded.updated_at"#,
        )
        .bind(serde_json::to_string(settings)?)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
