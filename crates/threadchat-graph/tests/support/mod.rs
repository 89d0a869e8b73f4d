#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use threadchat_checkpoint::{
    Checkpoint, CheckpointError, CheckpointResult, CheckpointStore, MemoryCheckpointStore,
};
use threadchat_core::{Message, ToolCallDelta, ToolSchema};
use threadchat_llm::{LLMChunk, LLMError, LLMProvider, LLMStream};

/// One scripted model response.
pub enum Reply {
    Chunks(Vec<LLMChunk>),
    /// The request itself fails (bad status, connection refused).
    RequestError(String),
    /// Some chunks arrive, then the stream breaks.
    BrokenStream(Vec<LLMChunk>, String),
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Chunks(
            text.split_inclusive(' ')
                .map(|piece| LLMChunk::Token(piece.to_string()))
                .chain(std::iter::once(LLMChunk::Done))
                .collect(),
        )
    }

    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        let (head, tail) = arguments.split_at(arguments.len() / 2);
        Reply::Chunks(vec![
            LLMChunk::ToolCalls(vec![ToolCallDelta {
                index: 0,
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                arguments: Some(head.to_string()),
            }]),
            LLMChunk::ToolCalls(vec![ToolCallDelta {
                index: 0,
                arguments: Some(tail.to_string()),
                ..Default::default()
            }]),
            LLMChunk::Done,
        ])
    }
}

/// Replays queued replies in order and records what each request carried.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<(Vec<Message>, usize)>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        _max_output_tokens: Option<u32>,
    ) -> Result<LLMStream, LLMError> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), tools.len()));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::text("(script exhausted)"));

        match reply {
            Reply::Chunks(chunks) => Ok(Box::pin(futures::stream::iter(
                chunks.into_iter().map(Ok),
            ))),
            Reply::RequestError(message) => Err(LLMError::Api(message)),
            Reply::BrokenStream(chunks, message) => {
                let items: Vec<Result<LLMChunk, LLMError>> = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(LLMError::Stream(message))))
                    .collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Delegates to a memory store but fails every save once `fail_after` saves
/// have succeeded.
pub struct FlakyStore {
    inner: MemoryCheckpointStore,
    remaining: Mutex<usize>,
}

impl FlakyStore {
    pub fn new(fail_after: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCheckpointStore::new(),
            remaining: Mutex::new(fail_after),
        })
    }
}

#[async_trait]
impl CheckpointStore for FlakyStore {
    async fn save(&self, thread_id: &str, messages: &[Message]) -> CheckpointResult<Checkpoint> {
        {
            let mut remaining = self.remaining.lock().unwrap();
            if *remaining == 0 {
                return Err(CheckpointError::Io(std::io::Error::other("disk full")));
            }
            *remaining -= 1;
        }
        self.inner.save(thread_id, messages).await
    }

    async fn latest(&self, thread_id: &str) -> CheckpointResult<Option<Checkpoint>> {
        self.inner.latest(thread_id).await
    }

    async fn list_threads(&self) -> CheckpointResult<Vec<String>> {
        self.inner.list_threads().await
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}
