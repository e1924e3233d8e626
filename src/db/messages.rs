use crate::db::models::Message;
use crate::db::sqlite::SqlitePool;
use crate::error::FleetError;
use chrono::Utc;

#[derive(Clone)]
pub struct MessagesStorage {
    pool: SqlitePool,
}

impl MessagesStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        sender: &str,
        recipient: &str,
        body: &str,
    ) -> Result<Message, FleetError> {
        let sent_at = Utc::now();
        let res = sqlx::query(
            "INSERT INTO messages (sender, recipient, body, sent_at, read) VALUES (?, ?, ?, ?, 0)",
        )
        .bind(sender)
        .bind(recipient)
        .bind(body)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id: res.last_insert_rowid(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            body: body.to_string(),
            sent_at,
            read: false,
        })
    }

    /// Messages addressed to `recipient`, newest first.
    pub async fn inbox(&self, recipient: &str) -> Result<Vec<Message>, FleetError> {
        let rows = sqlx::query_as::<_, Message>(
            r#"SELECT id, sender, recipient, body, sent_at, read
               FROM messages WHERE recipient = ? ORDER BY sent_at DESC, id DESC"#,
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Only the recipient can mark a message; returns false otherwise.
    pub async fn mark_read(&self, id: i64, recipient: &str) -> Result<bool, FleetError> {
        let res = sqlx::query("UPDATE messages SET read = 1 WHERE id = ? AND recipient = ?")
            .bind(id)
            .bind(recipient)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
