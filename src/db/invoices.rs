use chrono::{Datelike, NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::Storage;
use super::models::{ClientSummary, Invoice, InvoiceDetail, InvoiceItem, InvoiceStatus, Tenant};
use super::params::{InvoicePatch, NewInvoice, NewInvoiceItem, require_non_negative, require_text};
use super::sqlite::{OwnedTable, ensure_owned, next_number};
use crate::error::LawdeskError;

const INVOICE_COLUMNS: &str = "id, number, amount, status, date, due_date, client_id, lawyer_id, \
                               created_at";

fn check_items(items: &[NewInvoiceItem]) -> Result<(), LawdeskError> {
    for item in items {
        require_text(&item.description, "وصف البند")?;
        require_non_negative(item.amount)?;
    }
    Ok(())
}

fn check_dates(date: NaiveDate, due_date: NaiveDate) -> Result<(), LawdeskError> {
    if due_date < date {
        return Err(LawdeskError::validation(
            "تاريخ الاستحقاق يجب أن يكون بعد تاريخ الفاتورة",
        ));
    }
    Ok(())
}

/// Invoice total: the item sum when items are given, else the explicit amount.
fn invoice_amount(items: &[NewInvoiceItem], explicit: Option<f64>) -> Result<f64, LawdeskError> {
    let amount = if items.is_empty() {
        explicit.ok_or_else(|| LawdeskError::validation("المبلغ أو بنود الفاتورة مطلوبة"))?
    } else {
        items.iter().map(|item| item.amount).sum()
    };
    require_non_negative(amount)?;
    Ok(amount)
}

async fn insert_items(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    items: Vec<NewInvoiceItem>,
) -> Result<Vec<InvoiceItem>, LawdeskError> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row = InvoiceItem {
            id: Uuid::new_v4().to_string(),
            description: item.description.trim().to_string(),
            amount: item.amount,
            invoice_id: invoice_id.to_string(),
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"INSERT INTO invoice_items (id, description, amount, invoice_id, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&row.id)
        .bind(&row.description)
        .bind(row.amount)
        .bind(&row.invoice_id)
        .bind(row.created_at)
        .execute(&mut *conn)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

impl Storage {
    async fn client_summary(
        &self,
        client_id: Option<&str>,
    ) -> Result<Option<ClientSummary>, LawdeskError> {
        let Some(client_id) = client_id else {
            return Ok(None);
        };
        Ok(
            sqlx::query_as::<_, ClientSummary>("SELECT id, name FROM clients WHERE id = ?")
                .bind(client_id)
                .fetch_optional(self.pool())
                .await?,
        )
    }

    async fn invoice_detail(&self, invoice: Invoice) -> Result<InvoiceDetail, LawdeskError> {
        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"SELECT id, description, amount, invoice_id, created_at
               FROM invoice_items WHERE invoice_id = ? ORDER BY created_at ASC"#,
        )
        .bind(&invoice.id)
        .fetch_all(self.pool())
        .await?;
        let client = self.client_summary(invoice.client_id.as_deref()).await?;
        Ok(InvoiceDetail {
            invoice,
            items,
            client,
        })
    }

    async fn get_invoice_row(&self, tenant: Tenant<'_>, id: &str) -> Result<Invoice, LawdeskError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ? AND (? IS NULL OR lawyer_id = ?)"
        );
        sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_optional(self.pool())
            .await?
            .ok_or(LawdeskError::NotFound("invoice"))
    }

    pub async fn list_invoices(&self, tenant: Tenant<'_>) -> Result<Vec<InvoiceDetail>, LawdeskError> {
        let sql = format!(
            r#"SELECT {INVOICE_COLUMNS} FROM invoices
               WHERE (? IS NULL OR lawyer_id = ?)
               ORDER BY created_at DESC"#
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_all(self.pool())
            .await?;

        let mut details = Vec::with_capacity(invoices.len());
        for invoice in invoices {
            details.push(self.invoice_detail(invoice).await?);
        }
        Ok(details)
    }

    pub async fn get_invoice(&self, tenant: Tenant<'_>, id: &str) -> Result<InvoiceDetail, LawdeskError> {
        let invoice = self.get_invoice_row(tenant, id).await?;
        self.invoice_detail(invoice).await
    }

    /// Insert an invoice and its items in one transaction, numbering it `INV-<year>-<NNN>`.
    pub async fn create_invoice(
        &self,
        lawyer_id: String,
        new: NewInvoice,
    ) -> Result<InvoiceDetail, LawdeskError> {
        check_items(&new.items)?;
        let amount = invoice_amount(&new.items, new.amount)?;
        let now = Utc::now();
        let date = new.date.unwrap_or_else(|| now.date_naive());
        check_dates(date, new.due_date)?;

        let mut tx = self.begin_write().await?;
        ensure_owned(&mut tx, OwnedTable::Clients, &new.client_id, &lawyer_id).await?;
        let number = next_number(&mut tx, "invoices", &format!("INV-{}-", date.year())).await?;

        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            number,
            amount,
            status: new.status.unwrap_or(InvoiceStatus::Unpaid),
            date,
            due_date: new.due_date,
            client_id: Some(new.client_id),
            lawyer_id,
            created_at: now,
        };
        sqlx::query(
            r#"INSERT INTO invoices (
                   id, number, amount, status, date, due_date, client_id, lawyer_id, created_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&invoice.id)
        .bind(&invoice.number)
        .bind(invoice.amount)
        .bind(invoice.status)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(&invoice.client_id)
        .bind(&invoice.lawyer_id)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;
        let items = insert_items(&mut tx, &invoice.id, new.items).await?;
        tx.commit().await?;

        let client = self.client_summary(invoice.client_id.as_deref()).await?;
        Ok(InvoiceDetail {
            invoice,
            items,
            client,
        })
    }

    /// Patch an invoice. Replacing the items recomputes the amount from them.
    pub async fn update_invoice(
        &self,
        tenant: Tenant<'_>,
        id: &str,
        patch: InvoicePatch,
    ) -> Result<InvoiceDetail, LawdeskError> {
        let existing = self.get_invoice_row(tenant, id).await?;
        check_dates(
            patch.date.unwrap_or(existing.date),
            patch.due_date.unwrap_or(existing.due_date),
        )?;

        let amount = match &patch.items {
            Some(items) => {
                check_items(items)?;
                Some(invoice_amount(items, patch.amount.or(Some(existing.amount)))?)
            }
            None => {
                if let Some(amount) = patch.amount {
                    require_non_negative(amount)?;
                }
                patch.amount
            }
        };

        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"UPDATE invoices SET
                 status = COALESCE(?, status),
                 date = COALESCE(?, date),
                 due_date = COALESCE(?, due_date),
                 amount = COALESCE(?, amount)
               WHERE id = ?"#,
        )
        .bind(patch.status)
        .bind(patch.date)
        .bind(patch.due_date)
        .bind(amount)
        .bind(&existing.id)
        .execute(&mut *tx)
        .await?;

        if let Some(items) = patch.items {
            sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?")
                .bind(&existing.id)
                .execute(&mut *tx)
                .await?;
            insert_items(&mut tx, &existing.id, items).await?;
        }
        tx.commit().await?;

        self.get_invoice(tenant, id).await
    }

    pub async fn delete_invoice(&self, tenant: Tenant<'_>, id: &str) -> Result<(), LawdeskError> {
        let existing = self.get_invoice_row(tenant, id).await?;
        // items go with the invoice through ON DELETE CASCADE
        sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(&existing.id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(amount: f64) -> NewInvoiceItem {
        NewInvoiceItem {
            description: "استشارة".to_string(),
            amount,
        }
    }

    #[test]
    fn amount_is_item_sum_when_items_present() {
        let amount = invoice_amount(&[item(1500.0), item(250.5)], Some(1.0)).unwrap();
        assert_eq!(amount, 1750.5);
    }

    #[test]
    fn amount_falls_back_to_explicit_value() {
        assert_eq!(invoice_amount(&[], Some(300.0)).unwrap(), 300.0);
        assert!(matches!(
            invoice_amount(&[], None),
            Err(LawdeskError::Validation(_))
        ));
        assert!(invoice_amount(&[], Some(-1.0)).is_err());
    }

    #[test]
    fn due_date_must_not_precede_date() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert!(check_dates(d("2026-03-01"), d("2026-03-01")).is_ok());
        assert!(check_dates(d("2026-03-01"), d("2026-02-28")).is_err());
    }
}
