use chrono::{Datelike, Utc};
use uuid::Uuid;

use super::Storage;
use super::clients::like_pattern;
use super::models::{Case, CaseStatus, Tenant};
use super::params::{CaseFilter, CasePatch, NewCase, require_text, require_text_if_set};
use super::sqlite::{OwnedTable, ensure_owned, next_number};
use crate::error::LawdeskError;

const CASE_COLUMNS: &str = "id, number, title, description, type, court, status, client_id, \
                            lawyer_id, created_at, updated_at";

impl Storage {
    pub async fn list_cases(
        &self,
        tenant: Tenant<'_>,
        filter: &CaseFilter,
    ) -> Result<Vec<Case>, LawdeskError> {
        let pattern = like_pattern(filter.search.as_deref());
        let sql = format!(
            r#"SELECT {CASE_COLUMNS} FROM cases
               WHERE (? IS NULL OR lawyer_id = ?)
                 AND (? IS NULL OR status = ?)
                 AND (? IS NULL OR number LIKE ? OR title LIKE ?)
               ORDER BY created_at DESC"#
        );
        Ok(sqlx::query_as::<_, Case>(&sql)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .bind(filter.status)
            .bind(filter.status)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn get_case(&self, tenant: Tenant<'_>, id: &str) -> Result<Case, LawdeskError> {
        let sql = format!(
            "SELECT {CASE_COLUMNS} FROM cases WHERE id = ? AND (? IS NULL OR lawyer_id = ?)"
        );
        sqlx::query_as::<_, Case>(&sql)
            .bind(id)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_optional(self.pool())
            .await?
            .ok_or(LawdeskError::NotFound("case"))
    }

    /// Insert a case; numbers it `CASE-<year>-<NNN>` when no number is given.
    pub async fn create_case(&self, lawyer_id: String, new: NewCase) -> Result<Case, LawdeskError> {
        require_text(&new.title, "عنوان القضية")?;
        require_text(&new.case_type, "نوع القضية")?;
        require_text(&new.court, "المحكمة")?;

        let now = Utc::now();
        let mut tx = self.begin_write().await?;

        if let Some(client_id) = new.client_id.as_deref() {
            ensure_owned(&mut tx, OwnedTable::Clients, client_id, &lawyer_id).await?;
        }

        let number = match new.number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => next_number(&mut tx, "cases", &format!("CASE-{}-", now.year())).await?,
        };

        let case = Case {
            id: Uuid::new_v4().to_string(),
            number,
            title: new.title.trim().to_string(),
            description: new.description,
            case_type: new.case_type.trim().to_string(),
            court: new.court.trim().to_string(),
            status: new.status.unwrap_or(CaseStatus::Open),
            client_id: new.client_id,
            lawyer_id,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO cases (
                   id, number, title, description, type, court, status,
                   client_id, lawyer_id, created_at, updated_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&case.id)
        .bind(&case.number)
        .bind(&case.title)
        .bind(&case.description)
        .bind(&case.case_type)
        .bind(&case.court)
        .bind(case.status)
        .bind(&case.client_id)
        .bind(&case.lawyer_id)
        .bind(case.created_at)
        .bind(case.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(case)
    }

    pub async fn update_case(
        &self,
        tenant: Tenant<'_>,
        id: &str,
        patch: CasePatch,
    ) -> Result<Case, LawdeskError> {
        require_text_if_set(patch.title.as_deref(), "عنوان القضية")?;
        require_text_if_set(patch.case_type.as_deref(), "نوع القضية")?;
        require_text_if_set(patch.court.as_deref(), "المحكمة")?;

        let existing = self.get_case(tenant, id).await?;
        let mut tx = self.pool().begin().await?;
        if let Some(Some(client_id)) = patch.client_id.as_ref() {
            ensure_owned(&mut tx, OwnedTable::Clients, client_id, &existing.lawyer_id).await?;
        }

        sqlx::query(
            r#"UPDATE cases SET
                 title = COALESCE(?, title),
                 description = CASE WHEN ? THEN ? ELSE description END,
                 type = COALESCE(?, type),
                 court = COALESCE(?, court),
                 status = COALESCE(?, status),
                 client_id = CASE WHEN ? THEN ? ELSE client_id END,
                 updated_at = ?
               WHERE id = ?"#,
        )
        .bind(patch.title.as_deref().map(str::trim))
        .bind(patch.description.is_some())
        .bind(patch.description.flatten())
        .bind(patch.case_type.as_deref().map(str::trim))
        .bind(patch.court.as_deref().map(str::trim))
        .bind(patch.status)
        .bind(patch.client_id.is_some())
        .bind(patch.client_id.flatten())
        .bind(Utc::now())
        .bind(&existing.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.get_case(tenant, id).await
    }

    pub async fn delete_case(&self, tenant: Tenant<'_>, id: &str) -> Result<(), LawdeskError> {
        let existing = self.get_case(tenant, id).await?;
        sqlx::query("DELETE FROM cases WHERE id = ?")
            .bind(&existing.id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
