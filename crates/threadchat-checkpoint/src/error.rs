use thiserror::Error;

pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Failure of the persistence backend.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("time parse error: {0}")]
    Chrono(#[from] chrono::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid thread id: {0}")]
    InvalidThreadId(String),

    #[error("storage task join error: {0}")]
    Task(String),

    #[error("invalid store configuration: {0}")]
    Config(String),
}
