use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::Storage;
use super::models::Prompt;
use super::params::{NewPrompt, PromptPatch, require_text, require_text_if_set};
use crate::error::LawdeskError;

const PROMPT_COLUMNS: &str = "id, content, is_default, created_at, updated_at";

/// At most one prompt is the default; clear the flag everywhere except `keep_id`.
async fn clear_other_defaults(conn: &mut SqliteConnection, keep_id: &str) -> Result<(), LawdeskError> {
    sqlx::query("UPDATE prompts SET is_default = 0, updated_at = ? WHERE is_default = 1 AND id <> ?")
        .bind(Utc::now())
        .bind(keep_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

impl Storage {
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>, LawdeskError> {
        let sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts ORDER BY created_at DESC");
        Ok(sqlx::query_as::<_, Prompt>(&sql)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn get_prompt(&self, id: &str) -> Result<Prompt, LawdeskError> {
        let sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?");
        sqlx::query_as::<_, Prompt>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(LawdeskError::NotFound("prompt"))
    }

    pub async fn default_prompt(&self) -> Result<Option<Prompt>, LawdeskError> {
        let sql = format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE is_default = 1 LIMIT 1");
        Ok(sqlx::query_as::<_, Prompt>(&sql)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn create_prompt(&self, new: NewPrompt) -> Result<Prompt, LawdeskError> {
        require_text(&new.content, "نص التوجيه")?;
        let now = Utc::now();
        let prompt = Prompt {
            id: Uuid::new_v4().to_string(),
            content: new.content.trim().to_string(),
            is_default: new.is_default,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"INSERT INTO prompts (id, content, is_default, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&prompt.id)
        .bind(&prompt.content)
        .bind(prompt.is_default)
        .bind(prompt.created_at)
        .bind(prompt.updated_at)
        .execute(&mut *tx)
        .await?;
        if prompt.is_default {
            clear_other_defaults(&mut tx, &prompt.id).await?;
        }
        tx.commit().await?;
        Ok(prompt)
    }

    pub async fn update_prompt(&self, id: &str, patch: PromptPatch) -> Result<Prompt, LawdeskError> {
        require_text_if_set(patch.content.as_deref(), "نص التوجيه")?;
        let existing = self.get_prompt(id).await?;

        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"UPDATE prompts SET
                 content = COALESCE(?, content),
                 is_default = COALESCE(?, is_default),
                 updated_at = ?
               WHERE id = ?"#,
        )
        .bind(patch.content.as_deref().map(str::trim))
        .bind(patch.is_default)
        .bind(Utc::now())
        .bind(&existing.id)
        .execute(&mut *tx)
        .await?;
        if patch.is_default == Some(true) {
            clear_other_defaults(&mut tx, &existing.id).await?;
        }
        tx.commit().await?;

        self.get_prompt(id).await
    }

    /// Make `id` the only default prompt.
    pub async fn set_default_prompt(&self, id: &str) -> Result<Prompt, LawdeskError> {
        self.update_prompt(
            id,
            PromptPatch {
                content: None,
                is_default: Some(true),
            },
        )
        .await
    }

    pub async fn delete_prompt(&self, id: &str) -> Result<(), LawdeskError> {
        let res = sqlx::query("DELETE FROM prompts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(LawdeskError::NotFound("prompt"));
        }
        Ok(())
    }
}
