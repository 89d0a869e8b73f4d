#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use threadchat_checkpoint::{
    Checkpoint, CheckpointError, CheckpointResult, CheckpointStore, MemoryCheckpointStore,
};
use threadchat_core::{Message, ToolCallDelta, ToolSchema};
use threadchat_llm::{LLMChunk, LLMError, LLMProvider, LLMStream};

pub enum Reply {
    Text(String),
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },
    /// Never yields; only cancellation ends the turn.
    Hang,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }

    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        Reply::ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }
}

pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
        })
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat_stream(
        &self,
        _messages: &[Message],
        _tools: &[ToolSchema],
        _max_output_tokens: Option<u32>,
    ) -> Result<LLMStream, LLMError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::Api("script exhausted".to_string()))?;

        let chunks: Vec<LLMChunk> = match reply {
            Reply::Text(text) => text
                .split_inclusive(' ')
                .map(|piece| LLMChunk::Token(piece.to_string()))
                .chain(std::iter::once(LLMChunk::Done))
                .collect(),
            Reply::ToolCall {
                id,
                name,
                arguments,
            } => vec![
                LLMChunk::ToolCalls(vec![ToolCallDelta {
                    index: 0,
                    id: Some(id),
                    name: Some(name),
                    arguments: Some(arguments),
                }]),
                LLMChunk::Done,
            ],
            Reply::Hang => return Ok(Box::pin(futures::stream::pending())),
        };

        Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
    }
}

/// A store whose listing always fails.
pub struct UnreachableStore;

#[async_trait]
impl CheckpointStore for UnreachableStore {
    async fn save(&self, _thread_id: &str, _messages: &[Message]) -> CheckpointResult<Checkpoint> {
        Err(CheckpointError::Config("connection refused".to_string()))
    }

    async fn latest(&self, _thread_id: &str) -> CheckpointResult<Option<Checkpoint>> {
        Err(CheckpointError::Config("connection refused".to_string()))
    }

    async fn list_threads(&self) -> CheckpointResult<Vec<String>> {
        Err(CheckpointError::Config("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

/// Reads work; every save fails.
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemoryCheckpointStore,
}

#[async_trait]
impl CheckpointStore for ReadOnlyStore {
    async fn save(&self, _thread_id: &str, _messages: &[Message]) -> CheckpointResult<Checkpoint> {
        Err(CheckpointError::Io(std::io::Error::other("disk full")))
    }

    async fn latest(&self, thread_id: &str) -> CheckpointResult<Option<Checkpoint>> {
        self.inner.latest(thread_id).await
    }

    async fn list_threads(&self) -> CheckpointResult<Vec<String>> {
        self.inner.list_threads().await
    }

    fn backend(&self) -> &'static str {
        "read-only"
    }
}

/// Loads wait until `open` is called; everything else goes straight through.
pub struct GatedStore {
    inner: MemoryCheckpointStore,
    gate: Semaphore,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCheckpointStore::new(),
            gate: Semaphore::new(0),
        })
    }

    pub fn open(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS);
    }
}

#[async_trait]
impl CheckpointStore for GatedStore {
    async fn save(&self, thread_id: &str, messages: &[Message]) -> CheckpointResult<Checkpoint> {
        self.inner.save(thread_id, messages).await
    }

    async fn latest(&self, thread_id: &str) -> CheckpointResult<Option<Checkpoint>> {
        self.inner.latest(thread_id).await
    }

    async fn load(&self, thread_id: &str) -> CheckpointResult<Vec<Message>> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| CheckpointError::Config(e.to_string()))?;
        self.inner.load(thread_id).await
    }

    async fn list_threads(&self) -> CheckpointResult<Vec<String>> {
        self.inner.list_threads().await
    }

    fn backend(&self) -> &'static str {
        "gated"
    }
}
