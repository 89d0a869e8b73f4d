use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use threadchat_core::Message;

use crate::error::{CheckpointError, CheckpointResult};
use crate::store::{validate_thread_id, CheckpointStore};
use crate::types::Checkpoint;

/// Local single-file store. Each operation opens its own connection on the
/// blocking pool; every save is one `IMMEDIATE` transaction, so writers to the
/// same file are serialized.
#[derive(Debug, Clone)]
pub struct SqliteCheckpointStore {
    db_path: PathBuf,
}

impl SqliteCheckpointStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn with_connection<T, F>(&self, func: F) -> CheckpointResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> CheckpointResult<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = open_connection(&db_path)?;
            func(&mut connection)
        })
        .await
        .map_err(|error| CheckpointError::Task(error.to_string()))?
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn init(&self) -> CheckpointResult<()> {
        self.with_connection(|connection| {
            connection.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS threads (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    thread_id TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS checkpoints (
                    thread_id TEXT NOT NULL REFERENCES threads(thread_id),
                    step INTEGER NOT NULL,
                    messages TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (thread_id, step)
                );
                "#,
            )?;
            Ok(())
        })
        .await
    }

    async fn save(&self, thread_id: &str, messages: &[Message]) -> CheckpointResult<Checkpoint> {
        validate_thread_id(thread_id)?;

        let thread_id = thread_id.to_string();
        let messages = messages.to_vec();
        let encoded = serde_json::to_string(&messages)?;
        let created_at = Utc::now();

        self.with_connection(move |connection| {
            let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

            tx.execute(
                "INSERT OR IGNORE INTO threads (thread_id, created_at) VALUES (?1, ?2)",
                params![thread_id, format_timestamp(created_at)],
            )?;
            let previous: i64 = tx.query_row(
                "SELECT COALESCE(MAX(step), 0) FROM checkpoints WHERE thread_id = ?1",
                params![thread_id],
                |row| row.get(0),
            )?;
            let step = previous + 1;
            tx.execute(
                "INSERT INTO checkpoints (thread_id, step, messages, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![thread_id, step, encoded, format_timestamp(created_at)],
            )?;
            tx.commit()?;

            log::debug!("[{}] sqlite checkpoint step {} saved", thread_id, step);
            Ok(Checkpoint {
                thread_id,
                step: step as u64,
                messages,
                created_at,
            })
        })
        .await
    }

    async fn latest(&self, thread_id: &str) -> CheckpointResult<Option<Checkpoint>> {
        validate_thread_id(thread_id)?;

        let thread_id = thread_id.to_string();
        self.with_connection(move |connection| {
            let row: Option<(i64, String, String)> = connection
                .query_row(
                    "SELECT step, messages, created_at FROM checkpoints
                     WHERE thread_id = ?1 ORDER BY step DESC LIMIT 1",
                    params![thread_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((step, messages, created_at)) = row else {
                return Ok(None);
            };

            Ok(Some(Checkpoint {
                thread_id,
                step: step as u64,
                messages: serde_json::from_str(&messages)?,
                created_at: parse_timestamp(&created_at)?,
            }))
        })
        .await
    }

    async fn list_threads(&self) -> CheckpointResult<Vec<String>> {
        self.with_connection(|connection| {
            let mut statement = connection.prepare("SELECT thread_id FROM threads ORDER BY seq")?;
            let rows = statement.query_map([], |row| row.get::<_, String>(0))?;
            let mut threads = Vec::new();
            for row in rows {
                threads.push(row?);
            }
            Ok(threads)
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

fn open_connection(path: &Path) -> CheckpointResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let connection = Connection::open(path)?;
    connection.busy_timeout(Duration::from_secs(5))?;
    connection.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        "#,
    )?;
    Ok(connection)
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

fn parse_timestamp(raw: &str) -> CheckpointResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
