use thiserror::Error;
use threadchat_checkpoint::CheckpointError;
use threadchat_llm::LLMError;

/// Reasons a turn stops before reaching `exit`.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The model endpoint failed or its stream broke. Not retried.
    #[error("Upstream model error: {0}")]
    Upstream(#[from] LLMError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] CheckpointError),

    #[error("Turn exceeded {0} steps")]
    StepLimit(usize),

    #[error("Cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, GraphError>;
