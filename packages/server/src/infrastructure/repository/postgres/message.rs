//! PostgreSQL MessageStore 実装
//!
//! テーブル `messages(id SERIAL, name TEXT NULL, content TEXT NOT NULL, timestamp TIMESTAMPTZ NOT NULL)`
//! に 1 行ずつ追記し、`timestamp` の降順で直近 N 件を読み出します。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions};

use crate::domain::{ChatMessage, MessageStore, StorageError};

const MAX_CONNECTIONS: u32 = 5;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id SERIAL PRIMARY KEY,
    name TEXT NULL,
    content TEXT NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL
)
"#;

const INSERT_MESSAGE: &str =
    "INSERT INTO messages (name, content, timestamp) VALUES ($1, $2, $3)";

const SELECT_RECENT: &str = r#"
SELECT id, name, content, timestamp
FROM messages
ORDER BY timestamp DESC, id DESC
LIMIT $1
"#;

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Tls(_) => StorageError::Unavailable(e.to_string()),
            other => StorageError::Query(other.to_string()),
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    id: i32,
    name: Option<String>,
    content: String,
    timestamp: DateTime<Utc>,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage::new(row.name.unwrap_or_default(), row.content, row.timestamp)
            .with_id(i64::from(row.id))
    }
}

/// PostgreSQL MessageStore 実装
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    /// 接続プールを作成し、疎通確認とテーブル作成を行う
    ///
    /// # Errors
    ///
    /// 接続できない場合、またはテーブルを作成できない場合は `StorageError` を返す。
    /// 起動時のエラーとして扱われ、プロセスは終了する。
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        tracing::info!("Connected to PostgreSQL, messages table ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn store(&self, message: &ChatMessage) -> Result<(), StorageError> {
        sqlx::query(INSERT_MESSAGE)
            .bind(&message.name)
            .bind(&message.content)
            .bind(message.timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<ChatMessage>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<MessageRow> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }
}
