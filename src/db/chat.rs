use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

use super::Storage;
use super::models::{ChatMessage, Feedback, Sender, Tenant};
use super::params::{NewCaseMessage, require_text};
use crate::error::LawdeskError;

const MESSAGE_COLUMNS: &str = "id, user_id, case_id, sender, content, feedback, created_at";

/// `chat_messages` row with feedback still in its JSON text form.
#[derive(FromRow)]
struct MessageRow {
    id: String,
    user_id: String,
    case_id: Option<String>,
    sender: Sender,
    content: String,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        let feedback = row.feedback.and_then(|raw| {
            serde_json::from_str::<Feedback>(&raw)
                .inspect_err(|e| warn!(message_id = %row.id, error = %e, "unreadable feedback"))
                .ok()
        });
        ChatMessage {
            id: row.id,
            user_id: row.user_id,
            case_id: row.case_id,
            sender: row.sender,
            content: row.content,
            feedback,
            created_at: row.created_at,
        }
    }
}

impl Storage {
    /// Append one message. `case_id = None` means the user's assistant conversation.
    pub async fn insert_message(
        &self,
        user_id: &str,
        case_id: Option<&str>,
        sender: Sender,
        content: &str,
    ) -> Result<ChatMessage, LawdeskError> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            case_id: case_id.map(str::to_string),
            sender,
            content: content.to_string(),
            feedback: None,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO chat_messages (id, user_id, case_id, sender, content, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&message.id)
        .bind(&message.user_id)
        .bind(&message.case_id)
        .bind(message.sender)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(self.pool())
        .await?;
        Ok(message)
    }

    /// The assistant conversation, oldest first. `limit` keeps only the newest N.
    pub async fn assistant_history(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ChatMessage>, LawdeskError> {
        // rowid breaks ties between messages written within the same instant
        let sql = format!(
            r#"SELECT {MESSAGE_COLUMNS} FROM (
                   SELECT {MESSAGE_COLUMNS}, rowid AS seq FROM chat_messages
                   WHERE user_id = ? AND case_id IS NULL
                   ORDER BY created_at DESC, seq DESC
                   LIMIT ?
               ) ORDER BY created_at ASC, seq ASC"#
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(user_id)
            .bind(limit.map_or(-1, i64::from))
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    /// Remove the assistant conversation; returns how many messages went away.
    pub async fn clear_assistant_history(&self, user_id: &str) -> Result<u64, LawdeskError> {
        let res = sqlx::query("DELETE FROM chat_messages WHERE user_id = ? AND case_id IS NULL")
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn set_feedback(
        &self,
        user_id: &str,
        message_id: &str,
        feedback: Feedback,
    ) -> Result<ChatMessage, LawdeskError> {
        let raw = serde_json::to_string(&feedback)?;
        let res = sqlx::query("UPDATE chat_messages SET feedback = ? WHERE id = ? AND user_id = ?")
            .bind(raw)
            .bind(message_id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(LawdeskError::NotFound("message"));
        }

        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE id = ?");
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(message_id)
            .fetch_one(self.pool())
            .await?;
        Ok(row.into())
    }

    /// Messages attached to a case, oldest first.
    pub async fn list_case_chat(
        &self,
        tenant: Tenant<'_>,
        case_id: &str,
    ) -> Result<Vec<ChatMessage>, LawdeskError> {
        let case = self.get_case(tenant, case_id).await?;
        let sql = format!(
            r#"SELECT {MESSAGE_COLUMNS} FROM chat_messages
               WHERE case_id = ?
               ORDER BY created_at ASC, rowid ASC"#
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(&case.id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    pub async fn post_case_chat(
        &self,
        tenant: Tenant<'_>,
        user_id: &str,
        case_id: &str,
        new: NewCaseMessage,
    ) -> Result<ChatMessage, LawdeskError> {
        require_text(&new.message, "نص الرسالة")?;
        let case = self.get_case(tenant, case_id).await?;
        self.insert_message(user_id, Some(&case.id), new.sender, new.message.trim())
            .await
    }
}
