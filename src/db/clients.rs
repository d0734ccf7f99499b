use chrono::Utc;
use uuid::Uuid;

use super::Storage;
use super::models::{Client, Tenant};
use super::params::{ClientFilter, ClientPatch, NewClient, require_text, require_text_if_set};
use crate::error::LawdeskError;

const CLIENT_COLUMNS: &str = "id, name, email, phone, address, type, lawyer_id, created_at";

/// `%term%` for LIKE filters; `None` for a missing or blank term.
pub(crate) fn like_pattern(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("%{t}%"))
}

impl Storage {
    pub async fn list_clients(
        &self,
        tenant: Tenant<'_>,
        filter: &ClientFilter,
    ) -> Result<Vec<Client>, LawdeskError> {
        let pattern = like_pattern(filter.search.as_deref());
        let sql = format!(
            r#"SELECT {CLIENT_COLUMNS} FROM clients
               WHERE (? IS NULL OR lawyer_id = ?)
                 AND (? IS NULL OR type = ?)
                 AND (? IS NULL OR name LIKE ? OR email LIKE ? OR phone LIKE ?)
               ORDER BY created_at DESC"#
        );
        Ok(sqlx::query_as::<_, Client>(&sql)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .bind(filter.client_type)
            .bind(filter.client_type)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn get_client(&self, tenant: Tenant<'_>, id: &str) -> Result<Client, LawdeskError> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ? AND (? IS NULL OR lawyer_id = ?)"
        );
        sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_optional(self.pool())
            .await?
            .ok_or(LawdeskError::NotFound("client"))
    }

    pub async fn create_client(&self, lawyer_id: String, new: NewClient) -> Result<Client, LawdeskError> {
        require_text(&new.name, "اسم العميل")?;
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            email: new.email,
            phone: new.phone,
            address: new.address,
            client_type: new.client_type,
            lawyer_id,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO clients (id, name, email, phone, address, type, lawyer_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(client.client_type)
        .bind(&client.lawyer_id)
        .bind(client.created_at)
        .execute(self.pool())
        .await?;
        Ok(client)
    }

    pub async fn update_client(
        &self,
        tenant: Tenant<'_>,
        id: &str,
        patch: ClientPatch,
    ) -> Result<Client, LawdeskError> {
        require_text_if_set(patch.name.as_deref(), "اسم العميل")?;
        let existing = self.get_client(tenant, id).await?;
        sqlx::query(
            r#"UPDATE clients SET
                 name = COALESCE(?, name),
                 email = CASE WHEN ? THEN ? ELSE email END,
                 phone = CASE WHEN ? THEN ? ELSE phone END,
                 address = CASE WHEN ? THEN ? ELSE address END,
                 type = COALESCE(?, type)
               WHERE id = ?"#,
        )
        .bind(patch.name.as_deref().map(str::trim))
        .bind(patch.email.is_some())
        .bind(patch.email.flatten())
        .bind(patch.phone.is_some())
        .bind(patch.phone.flatten())
        .bind(patch.address.is_some())
        .bind(patch.address.flatten())
        .bind(patch.client_type)
        .bind(&existing.id)
        .execute(self.pool())
        .await?;
        self.get_client(tenant, id).await
    }

    pub async fn delete_client(&self, tenant: Tenant<'_>, id: &str) -> Result<(), LawdeskError> {
        let existing = self.get_client(tenant, id).await?;
        sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(&existing.id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn blank_search_terms_do_not_filter() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(Some(" النيل ")), Some("%النيل%".to_string()));
    }
}
