use chrono::Utc;
use uuid::Uuid;

use super::Storage;
use super::models::PredefinedResponse;
use super::params::{
    NewPredefinedResponse, PredefinedResponsePatch, require_text, require_text_if_set,
};
use crate::error::LawdeskError;

const RESPONSE_COLUMNS: &str = "id, response, processing_time, valid_until, created_at";

/// Upper bound for the simulated delay of a canned reply, in seconds.
pub const MAX_PROCESSING_SECS: f64 = 300.0;

fn check_processing_time(seconds: f64) -> Result<(), LawdeskError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(LawdeskError::validation("وقت المعالجة يجب أن يكون رقماً موجباً"));
    }
    if seconds > MAX_PROCESSING_SECS {
        return Err(LawdeskError::validation(format!(
            "وقت المعالجة يجب ألا يتجاوز {MAX_PROCESSING_SECS} ثانية"
        )));
    }
    Ok(())
}

impl Storage {
    pub async fn list_predefined_responses(&self) -> Result<Vec<PredefinedResponse>, LawdeskError> {
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM predefined_responses ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, PredefinedResponse>(&sql)
            .fetch_all(self.pool())
            .await?)
    }

    /// Responses usable right now: no expiry or an expiry in the future.
    pub async fn valid_predefined_responses(&self) -> Result<Vec<PredefinedResponse>, LawdeskError> {
        let now = Utc::now();
        Ok(self
            .list_predefined_responses()
            .await?
            .into_iter()
            .filter(|r| r.is_valid_at(now))
            .collect())
    }

    pub async fn get_predefined_response(&self, id: &str) -> Result<PredefinedResponse, LawdeskError> {
        let sql = format!("SELECT {RESPONSE_COLUMNS} FROM predefined_responses WHERE id = ?");
        sqlx::query_as::<_, PredefinedResponse>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(LawdeskError::NotFound("predefined response"))
    }

    pub async fn create_predefined_response(
        &self,
        new: NewPredefinedResponse,
    ) -> Result<PredefinedResponse, LawdeskError> {
        require_text(&new.response, "نص الرد")?;
        check_processing_time(new.processing_time)?;
        let response = PredefinedResponse {
            id: Uuid::new_v4().to_string(),
            response: new.response.trim().to_string(),
            processing_time: new.processing_time,
            valid_until: new.valid_until,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO predefined_responses (id, response, processing_time, valid_until, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&response.id)
        .bind(&response.response)
        .bind(response.processing_time)
        .bind(response.valid_until)
        .bind(response.created_at)
        .execute(self.pool())
        .await?;
        Ok(response)
    }

    pub async fn update_predefined_response(
        &self,
        id: &str,
        patch: PredefinedResponsePatch,
    ) -> Result<PredefinedResponse, LawdeskError> {
        require_text_if_set(patch.response.as_deref(), "نص الرد")?;
        if let Some(seconds) = patch.processing_time {
            check_processing_time(seconds)?;
        }
        let existing = self.get_predefined_response(id).await?;
        sqlx::query(
            r#"UPDATE predefined_responses SET
                 response = COALESCE(?, response),
                 processing_time = COALESCE(?, processing_time),
                 valid_until = CASE WHEN ? THEN ? ELSE valid_until END
               WHERE id = ?"#,
        )
        .bind(patch.response.as_deref().map(str::trim))
        .bind(patch.processing_time)
        .bind(patch.valid_until.is_some())
        .bind(patch.valid_until.flatten())
        .bind(&existing.id)
        .execute(self.pool())
        .await?;
        self.get_predefined_response(id).await
    }

    pub async fn delete_predefined_response(&self, id: &str) -> Result<(), LawdeskError> {
        let res = sqlx::query("DELETE FROM predefined_responses WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(LawdeskError::NotFound("predefined response"));
        }
        Ok(())
    }
}
