use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use threadchat_core::Message;

use crate::error::CheckpointResult;
use crate::store::{validate_thread_id, CheckpointStore};
use crate::types::Checkpoint;

/// Networked store shared by many server processes. Writers to the same
/// thread are serialized with a row lock on the thread entry.
pub struct PostgresCheckpointStore {
    pool: sqlx::PgPool,
    threads_table: String,
    checkpoints_table: String,
}

impl PostgresCheckpointStore {
    /// Tables default to `chat_threads` and `chat_checkpoints`.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self::with_table_prefix(pool, "chat")
    }

    pub fn with_table_prefix(pool: sqlx::PgPool, prefix: &str) -> Self {
        Self {
            pool,
            threads_table: format!("{prefix}_threads"),
            checkpoints_table: format!("{prefix}_checkpoints"),
        }
    }

    pub async fn connect(url: &str, max_connections: u32) -> CheckpointResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CheckpointStore for PostgresCheckpointStore {
    async fn init(&self) -> CheckpointResult<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {threads} (
                seq        BIGSERIAL,
                thread_id  TEXT PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            CREATE TABLE IF NOT EXISTS {checkpoints} (
                thread_id  TEXT NOT NULL REFERENCES {threads}(thread_id),
                step       BIGINT NOT NULL,
                messages   JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (thread_id, step)
            );
            "#,
            threads = self.threads_table,
            checkpoints = self.checkpoints_table,
        );
        sqlx::raw_sql(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> CheckpointResult<Checkpoint> {
        validate_thread_id(thread_id)?;

        let encoded = serde_json::to_value(messages)?;
        let created_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO {} (thread_id) VALUES ($1) ON CONFLICT (thread_id) DO NOTHING",
            self.threads_table
        );
        sqlx::query(&sql).bind(thread_id).execute(&mut *tx).await?;

        // Lock the thread row so concurrent savers compute distinct steps.
        let sql = format!(
            "SELECT thread_id FROM {} WHERE thread_id = $1 FOR UPDATE",
            self.threads_table
        );
        sqlx::query(&sql).bind(thread_id).execute(&mut *tx).await?;

        let sql = format!(
            "SELECT COALESCE(MAX(step), 0) FROM {} WHERE thread_id = $1",
            self.checkpoints_table
        );
        let (previous,): (i64,) = sqlx::query_as(&sql)
            .bind(thread_id)
            .fetch_one(&mut *tx)
            .await?;
        let step = previous + 1;

        let sql = format!(
            "INSERT INTO {} (thread_id, step, messages, created_at) VALUES ($1, $2, $3, $4)",
            self.checkpoints_table
        );
        sqlx::query(&sql)
            .bind(thread_id)
            .bind(step)
            .bind(&encoded)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::debug!("[{}] postgres checkpoint step {} saved", thread_id, step);

        Ok(Checkpoint {
            thread_id: thread_id.to_string(),
            step: step as u64,
            messages: messages.to_vec(),
            created_at,
        })
    }

    async fn latest(&self, thread_id: &str) -> CheckpointResult<Option<Checkpoint>> {
        validate_thread_id(thread_id)?;

        let sql = format!(
            "SELECT step, messages, created_at FROM {} WHERE thread_id = $1 ORDER BY step DESC LIMIT 1",
            self.checkpoints_table
        );
        let row: Option<(i64, serde_json::Value, DateTime<Utc>)> = sqlx::query_as(&sql)
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some((step, messages, created_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Checkpoint {
            thread_id: thread_id.to_string(),
            step: step as u64,
            messages: serde_json::from_value(messages)?,
            created_at,
        }))
    }

    async fn list_threads(&self) -> CheckpointResult<Vec<String>> {
        let sql = format!("SELECT thread_id FROM {} ORDER BY seq", self.threads_table);
        let rows: Vec<(String,)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(thread_id,)| thread_id).collect())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
