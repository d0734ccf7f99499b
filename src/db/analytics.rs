//! Aggregates behind the lawyer dashboard and the admin overview.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;

use super::Storage;
use super::models::{Appointment, Tenant};
use crate::error::LawdeskError;

const UPCOMING_LIMIT: i64 = 10;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CaseStats {
    pub total: i64,
    pub open: i64,
    pub closed: i64,
    pub in_progress: i64,
    pub by_type: BTreeMap<String, i64>,
    /// Keyed `YYYY-MM` by creation month
    pub by_month: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ClientStats {
    pub total: i64,
    pub by_type: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DocumentStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FinanceStats {
    pub total_revenue: f64,
    pub pending_payments: f64,
    /// Paid amounts keyed `YYYY-MM` by invoice date
    pub revenue_by_month: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub cases: CaseStats,
    pub clients: ClientStats,
    pub documents: DocumentStats,
    pub finances: FinanceStats,
    pub upcoming_appointments: Vec<Appointment>,
}

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
pub struct LawyerCaseCount {
    pub lawyer_id: String,
    pub full_name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminStats {
    pub total_lawyers: i64,
    pub total_clients: i64,
    pub total_cases: i64,
    pub cases_by_status: BTreeMap<String, i64>,
    pub cases_per_lawyer: Vec<LawyerCaseCount>,
}

impl Storage {
    /// `SELECT <key>, COUNT(*)` over a tenant-scoped table.
    async fn count_by(
        &self,
        table: &'static str,
        key_expr: &'static str,
        tenant: Tenant<'_>,
    ) -> Result<BTreeMap<String, i64>, LawdeskError> {
        let sql = format!(
            r#"SELECT {key_expr} AS k, COUNT(*) FROM {table}
               WHERE (? IS NULL OR lawyer_id = ?)
               GROUP BY k"#
        );
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn sum_invoices(
        &self,
        tenant: Tenant<'_>,
        statuses: &'static str,
    ) -> Result<f64, LawdeskError> {
        let sql = format!(
            r#"SELECT COALESCE(SUM(amount), 0.0) FROM invoices
               WHERE (? IS NULL OR lawyer_id = ?) AND status IN ({statuses})"#
        );
        Ok(sqlx::query_scalar(&sql)
            .bind(tenant.lawyer_id())
            .bind(tenant.lawyer_id())
            .fetch_one(self.pool())
            .await?)
    }

    pub async fn dashboard_stats(&self, tenant: Tenant<'_>) -> Result<DashboardStats, LawdeskError> {
        let by_status = self.count_by("cases", "status", tenant).await?;
        let status_count = |key: &str| by_status.get(key).copied().unwrap_or(0);
        let cases = CaseStats {
            total: by_status.values().sum(),
            open: status_count("open"),
            closed: status_count("closed"),
            in_progress: status_count("in_progress"),
            by_type: self.count_by("cases", "type", tenant).await?,
            by_month: self.count_by("cases", "substr(created_at, 1, 7)", tenant).await?,
        };

        let client_types = self.count_by("clients", "type", tenant).await?;
        let clients = ClientStats {
            total: client_types.values().sum(),
            by_type: client_types,
        };

        let document_statuses = self.count_by("documents", "status", tenant).await?;
        let documents = DocumentStats {
            total: document_statuses.values().sum(),
            by_status: document_statuses,
        };

        let revenue_rows: Vec<(String, f64)> = sqlx::query_as(
            r#"SELECT substr(date, 1, 7) AS month, SUM(amount) FROM invoices
               WHERE (? IS NULL OR lawyer_id = ?) AND status = 'paid'
               GROUP BY month"#,
        )
        .bind(tenant.lawyer_id())
        .bind(tenant.lawyer_id())
        .fetch_all(self.pool())
        .await?;
        let finances = FinanceStats {
            total_revenue: self.sum_invoices(tenant, "'paid'").await?,
            pending_payments: self.sum_invoices(tenant, "'unpaid', 'overdue'").await?,
            revenue_by_month: revenue_rows.into_iter().collect(),
        };

        let upcoming_appointments = sqlx::query_as::<_, Appointment>(
            r#"SELECT id, title, type, date, location, notes, case_id, client_id, lawyer_id, created_at
               FROM appointments
               WHERE (? IS NULL OR lawyer_id = ?) AND date >= ?
               ORDER BY date ASC
               LIMIT ?"#,
        )
        .bind(tenant.lawyer_id())
        .bind(tenant.lawyer_id())
        .bind(Utc::now())
        .bind(UPCOMING_LIMIT)
        .fetch_all(self.pool())
        .await?;

        Ok(DashboardStats {
            cases,
            clients,
            documents,
            finances,
            upcoming_appointments,
        })
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, LawdeskError> {
        let total_lawyers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE role = 'lawyer'")
                .fetch_one(self.pool())
                .await?;
        let total_clients: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(self.pool())
            .await?;
        let cases_by_status = self.count_by("cases", "status", Tenant::All).await?;

        let cases_per_lawyer = sqlx::query_as::<_, LawyerCaseCount>(
            r#"SELECT p.id AS lawyer_id, p.full_name AS full_name, COUNT(c.id) AS count
               FROM profiles p
               LEFT JOIN cases c ON c.lawyer_id = p.id
               WHERE p.role = 'lawyer'
               GROUP BY p.id, p.full_name
               ORDER BY count DESC, p.full_name ASC"#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(AdminStats {
            total_lawyers,
            total_clients,
            total_cases: cases_by_status.values().sum(),
            cases_by_status,
            cases_per_lawyer,
        })
    }
}
