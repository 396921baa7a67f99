//! `SQLite`-backed context storage.
//!
//! A single `messages` table holds every turn; the scope key lives in the
//! `thread_id` column and insertion order comes from the autoincrement id.

use std::str::FromStr;

use log::debug;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::{BotError, Result};
use crate::types::{MessageRole, Turn};

const CREATE_MESSAGES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL
    )";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database and ensure the table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the database cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // In-memory databases are per connection, so keep a single one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and ensure the table exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(CREATE_MESSAGES_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Append one row for the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn save_turn(&self, scope_key: &str, turn: &Turn) -> Result<()> {
        sqlx::query("INSERT INTO messages (thread_id, role, content) VALUES (?, ?, ?)")
            .bind(scope_key)
            .bind(turn.role.as_ref())
            .bind(&turn.text)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All rows for the scope in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row holds a role other than
    /// `user` or `assistant`.
    pub async fn load_history(&self, scope_key: &str) -> Result<Vec<Turn>> {
        let rows = sqlx::query("SELECT role, content FROM messages WHERE thread_id = ? ORDER BY id")
            .bind(scope_key)
            .fetch_all(&self.pool)
            .await?;

        let mut turns = Vec::with_capacity(rows.len());
        for row in &rows {
            let role: String = row.try_get("role")?;
            let role = match MessageRole::from_str(&role) {
                Ok(role @ (MessageRole::User | MessageRole::Assistant)) => role,
                Ok(MessageRole::System) | Err(_) => return Err(BotError::UnknownRole(role)),
            };
            turns.push(Turn::new(role, row.try_get::<String, _>("content")?));
        }
        debug!("Loaded {} turns for {scope_key}", turns.len());
        Ok(turns)
    }

    /// Delete every row for the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear_history(&self, scope_key: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE thread_id = ?")
            .bind(scope_key)
            .execute(&self.pool)
            .await?;
        debug!("Deleted {} rows for {scope_key}", result.rows_affected());
        Ok(())
    }
}
