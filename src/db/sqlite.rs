use crate::auth::password::hash_password;
use crate::db::models::Role;
use crate::db::schema::SQLITE_INIT;
use crate::error::LawdeskError;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub type SqlitePool = Pool<Sqlite>;

/// Tables whose rows belong to a lawyer through `lawyer_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OwnedTable {
    Clients,
    Cases,
}

impl OwnedTable {
    fn name(self) -> &'static str {
        match self {
            OwnedTable::Clients => "clients",
            OwnedTable::Cases => "cases",
        }
    }

    fn entity(self) -> &'static str {
        match self {
            OwnedTable::Clients => "client",
            OwnedTable::Cases => "case",
        }
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, LawdeskError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to `sqlite::memory:` is its own database; pin a single one.
        let pool_opts = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = pool_opts.connect_with(connect_opts).await?;

        let storage = Self::new(pool);
        storage.init_schema().await?;
        info!(database_url, "database ready");
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Transaction holding the write lock from its first statement, for
    /// read-then-insert sequences such as [`next_number`].
    pub(crate) async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, LawdeskError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), LawdeskError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert the demo lawyer and admin accounts unless their emails already exist.
    pub async fn seed_demo_users(&self) -> Result<(), LawdeskError> {
        let seeds = [
            ("lawyer-test-id", "lawyer@example.com", Role::Lawyer, "محامي النظام", "lawyer123"),
            ("admin-test-id", "admin@example.com", Role::Admin, "مشرف النظام", "admin123"),
        ];
        for (id, email, role, full_name, password) in seeds {
            let hash = hash_password(password)?;
            let res = sqlx::query(
                r#"INSERT INTO profiles (id, email, role, full_name, password_hash, created_at)
                   VALUES (?, ?, ?, ?, ?, ?)
                   ON CONFLICT(email) DO NOTHING"#,
            )
            .bind(id)
            .bind(email)
            .bind(role)
            .bind(full_name)
            .bind(hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            if res.rows_affected() > 0 {
                info!(email, role = role.as_str(), "seeded demo account");
            }
        }
        Ok(())
    }
}

/// Check that `id` in `table` exists and is owned by `lawyer_id`.
pub(crate) async fn ensure_owned(
    conn: &mut SqliteConnection,
    table: OwnedTable,
    id: &str,
    lawyer_id: &str,
) -> Result<(), LawdeskError> {
    let sql = format!("SELECT lawyer_id FROM {} WHERE id = ?", table.name());
    let owner: Option<String> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match owner {
        None => Err(LawdeskError::NotFound(table.entity())),
        Some(owner) if owner != lawyer_id => {
            debug!(table = table.name(), id, "reference belongs to another lawyer");
            Err(LawdeskError::Forbidden)
        }
        Some(_) => Ok(()),
    }
}

/// Next `<prefix><NNN>` number: one past the largest numeric suffix already used.
pub(crate) async fn next_number(
    conn: &mut SqliteConnection,
    table: &'static str,
    prefix: &str,
) -> Result<String, LawdeskError> {
    let sql = format!(
        "SELECT MAX(CAST(substr(number, ?) AS INTEGER)) FROM {table} WHERE number LIKE ?"
    );
    let max: Option<i64> = sqlx::query_scalar(&sql)
        .bind(prefix.chars().count() as i64 + 1)
        .bind(format!("{prefix}%"))
        .fetch_one(&mut *conn)
        .await?;
    Ok(format!("{prefix}{:03}", max.unwrap_or(0) + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_storage() -> Storage {
        Storage::connect("sqlite::memory:")
            .await
            .expect("in-memory database")
    }

    #[tokio::test]
    async fn next_number_follows_largest_suffix() {
        let storage = memory_storage().await;
        storage.seed_demo_users().await.expect("seed");
        let mut conn = storage.pool().acquire().await.expect("conn");

        let first = next_number(&mut conn, "invoices", "INV-2026-").await.unwrap();
        assert_eq!(first, "INV-2026-001");

        for number in ["INV-2026-001", "INV-2026-007", "INV-2025-040"] {
            sqlx::query(
                "INSERT INTO invoices (id, number, amount, status, date, due_date, lawyer_id, created_at)
                 VALUES (?, ?, 0, 'unpaid', '2026-01-01', '2026-02-01', 'lawyer-test-id', '2026-01-01T00:00:00Z')",
            )
            .bind(number)
            .bind(number)
            .execute(&mut *conn)
            .await
            .unwrap();
        }

        let next = next_number(&mut conn, "invoices", "INV-2026-").await.unwrap();
        assert_eq!(next, "INV-2026-008");
    }

    #[tokio::test]
    async fn seeding_twice_keeps_one_row_per_account() {
        let storage = memory_storage().await;
        storage.seed_demo_users().await.unwrap();
        storage.seed_demo_users().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(storage.pool())
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn ensure_owned_distinguishes_missing_and_foreign() {
        let storage = memory_storage().await;
        storage.seed_demo_users().await.unwrap();
        let mut conn = storage.pool().acquire().await.unwrap();
        sqlx::query(
            "INSERT INTO clients (id, name, type, lawyer_id, created_at)
             VALUES ('c1', 'شركة النيل', 'company', 'lawyer-test-id', '2026-01-01T00:00:00Z')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();

        assert!(
            ensure_owned(&mut conn, OwnedTable::Clients, "c1", "lawyer-test-id")
                .await
                .is_ok()
        );
        assert!(matches!(
            ensure_owned(&mut conn, OwnedTable::Clients, "c1", "admin-test-id").await,
            Err(LawdeskError::Forbidden)
        ));
        assert!(matches!(
            ensure_owned(&mut conn, OwnedTable::Clients, "missing", "lawyer-test-id").await,
            Err(LawdeskError::NotFound("client"))
        ));
    }
}
