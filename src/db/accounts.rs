use crate::db::models::{DbAccount, Role};
use crate::db::sqlite::SqlitePool;
use crate::error::FleetError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

#[derive(Clone)]
pub struct AccountsStorage {
    pool: SqlitePool,
}

impl AccountsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64, FleetError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    /// Insert every account in one transaction, but only while the table is
    /// still empty. Returns whether anything was written.
    pub async fn insert_if_empty(&self, accounts: Vec<DbAccount>) -> Result<bool, FleetError> {
        let mut tx = self.pool.begin().await?;

        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&mut *tx)
            .await?;
        if rec.0 > 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for account in accounts {
            sqlx::query(
                "INSERT INTO accounts (username, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(account.username)
            .bind(account.password_hash)
            .bind(account.role.as_str())
            .bind(account.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn get(&self, username: &str) -> Result<Option<DbAccount>, FleetError> {
        let row = sqlx::query(
            "SELECT username, password_hash, role, created_at FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    pub async fn exists(&self, username: &str) -> Result<bool, FleetError> {
        let rec: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec.is_some())
    }

    pub async fn list(&self) -> Result<Vec<DbAccount>, FleetError> {
        let rows = sqlx::query(
            "SELECT username, password_hash, role, created_at FROM accounts ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    /// Returns false when no such account exists.
    pub async fn set_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, FleetError> {
        let res = sqlx::query("UPDATE accounts SET password_hash = ? WHERE username = ?")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    fn row_to_model(row: SqliteRow) -> Result<DbAccount, FleetError> {
        let username: String = row.try_get("username")?;
        let password_hash: String = row.try_get("password_hash")?;
        let role_str: String = row.try_get("role")?;
        let created_str: String = row.try_get("created_at")?;

        let role: Role = role_str
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(DbAccount {
            username,
            password_hash,
            role,
            created_at,
        })
    }
}
