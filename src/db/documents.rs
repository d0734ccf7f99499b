use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::Storage;
use super::appointments::ensure_references;
use super::models::{Document, DocumentStatus, Tenant};
use super::params::{DocumentFilter, DocumentPatch, NewDocument, require_text, require_text_if_set};
use crate::error::LawdeskError;

const DOCUMENT_COLUMNS: &str = "id, title, type, content, status, case_id, client_id, lawyer_id, \
                                created_at";

/// Replace every `{{key}}` in `template` with its value. Unknown keys stay as written.
pub fn fill_template(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match variables.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl Storage {
    pub async fn list_documents(
        &self,
        tenant: Tenant<'_>,
        filter: &DocumentFilter,
    ) -> Result<Vec<Document>, LawdeskError> {
        let sql = format!(
            r#"SELECT {DOCUMENT_COLUMNS} FROM documents
               WHERE (? IS NULL OR lawyer_id = ?)
                 AND (? IS NULL OR case_id = ?)
                 AND (? IS NULL OR status = ?)
               ORDER BY created_at DESC"#
        );
        Ok(sqlx::query_as::<_, Document>(&sql)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .bind(&filter.case_id)
            .bind(&filter.case_id)
            .bind(filter.status)
            .bind(filter.status)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn get_document(&self, tenant: Tenant<'_>, id: &str) -> Result<Document, LawdeskError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ? AND (? IS NULL OR lawyer_id = ?)"
        );
        sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_optional(self.pool())
            .await?
            .ok_or(LawdeskError::NotFound("document"))
    }

    /// Insert a document, filling template placeholders from `variables`.
    pub async fn create_document(
        &self,
        lawyer_id: String,
        new: NewDocument,
    ) -> Result<Document, LawdeskError> {
        require_text(&new.title, "عنوان المستند")?;
        require_text(&new.document_type, "نوع المستند")?;

        let mut conn = self.pool().acquire().await?;
        ensure_references(&mut conn, &lawyer_id, new.case_id.as_deref(), new.client_id.as_deref())
            .await?;

        let content = match new.content {
            Some(c) if !new.variables.is_empty() => Some(fill_template(&c, &new.variables)),
            other => other,
        };
        let document = Document {
            id: Uuid::new_v4().to_string(),
            title: new.title.trim().to_string(),
            document_type: new.document_type.trim().to_string(),
            content,
            status: new.status.unwrap_or(DocumentStatus::Draft),
            case_id: new.case_id,
            client_id: new.client_id,
            lawyer_id,
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO documents (
                   id, title, type, content, status, case_id, client_id, lawyer_id, created_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&document.id)
        .bind(&document.title)
        .bind(&document.document_type)
        .bind(&document.content)
        .bind(document.status)
        .bind(&document.case_id)
        .bind(&document.client_id)
        .bind(&document.lawyer_id)
        .bind(document.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(document)
    }

    pub async fn update_document(
        &self,
        tenant: Tenant<'_>,
        id: &str,
        patch: DocumentPatch,
    ) -> Result<Document, LawdeskError> {
        require_text_if_set(patch.title.as_deref(), "عنوان المستند")?;
        require_text_if_set(patch.document_type.as_deref(), "نوع المستند")?;
        let existing = self.get_document(tenant, id).await?;

        let mut conn = self.pool().acquire().await?;
        ensure_references(
            &mut conn,
            &existing.lawyer_id,
            patch.case_id.as_ref().and_then(|id| id.as_deref()),
            patch.client_id.as_ref().and_then(|id| id.as_deref()),
        )
        .await?;

        sqlx::query(
            r#"UPDATE documents SET
                 title = COALESCE(?, title),
                 type = COALESCE(?, type),
                 content = COALESCE(?, content),
                 status = COALESCE(?, status),
                 case_id = CASE WHEN ? THEN ? ELSE case_id END,
                 client_id = CASE WHEN ? THEN ? ELSE client_id END
               WHERE id = ?"#,
        )
        .bind(patch.title.as_deref().map(str::trim))
        .bind(patch.document_type.as_deref().map(str::trim))
        .bind(patch.content)
        .bind(patch.status)
        .bind(patch.case_id.is_some())
        .bind(patch.case_id.flatten())
        .bind(patch.client_id.is_some())
        .bind(patch.client_id.flatten())
        .bind(&existing.id)
        .execute(&mut *conn)
        .await?;
        drop(conn);

        self.get_document(tenant, id).await
    }

    pub async fn delete_document(&self, tenant: Tenant<'_>, id: &str) -> Result<(), LawdeskError> {
        let existing = self.get_document(tenant, id).await?;
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(&existing.id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::fill_template;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fills_known_placeholders() {
        let out = fill_template(
            "السيد {{client_name}} بخصوص القضية {{ case_number }}",
            &vars(&[("client_name", "أحمد"), ("case_number", "CASE-2026-001")]),
        );
        assert_eq!(out, "السيد أحمد بخصوص القضية CASE-2026-001");
    }

    #[test]
    fn keeps_unknown_and_unterminated_placeholders() {
        let v = vars(&[("a", "1")]);
        assert_eq!(fill_template("{{a}} {{b}} {{c", &v), "1 {{b}} {{c");
        assert_eq!(fill_template("no placeholders", &v), "no placeholders");
    }
}
