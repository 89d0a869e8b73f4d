use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use threadchat_checkpoint::CheckpointStore;
use threadchat_core::tools::{execute_tool_call, ToolExecutor};
use threadchat_core::{Message, TokenUsage, ToolSchema, TurnEvent};
use threadchat_llm::LLMProvider;

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::node::{arguments_for_event, route, GraphNode};
use crate::stream::consume_llm_stream;

/// Result of a turn that reached `exit`.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub thread_id: String,
    /// Full committed sequence after the turn.
    pub messages: Vec<Message>,
    /// Messages appended by this turn, starting with the user message.
    pub appended: usize,
    /// Content of the final assistant message.
    pub reply: String,
    pub usage: TokenUsage,
}

/// Runs turns through entry -> chat -> route -> (tool -> chat | exit),
/// committing the thread after every chat and tool step.
pub struct ChatGraph {
    llm: Arc<dyn LLMProvider>,
    tools: Arc<dyn ToolExecutor>,
    store: Arc<dyn CheckpointStore>,
    config: GraphConfig,
}

impl ChatGraph {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        tools: Arc<dyn ToolExecutor>,
        store: Arc<dyn CheckpointStore>,
        config: GraphConfig,
    ) -> Self {
        Self {
            llm,
            tools,
            store,
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Latest committed messages of a thread.
    pub async fn get_state(&self, thread_id: &str) -> Result<Vec<Message>> {
        Ok(self.store.load(thread_id).await?)
    }

    /// Run one turn and report its end on `event_tx`: `complete` on success,
    /// otherwise `error` (preceded by `persistence_error` when a commit failed).
    pub async fn run_turn(
        &self,
        thread_id: &str,
        user_message: &str,
        event_tx: &mpsc::Sender<TurnEvent>,
        cancel_token: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let started = Instant::now();
        let result = self
            .drive(thread_id, user_message, event_tx, cancel_token)
            .await;

        match &result {
            Ok(outcome) => {
                log::info!(
                    "[{}] Turn complete: {} new messages in {}ms",
                    thread_id,
                    outcome.appended,
                    started.elapsed().as_millis()
                );
                let _ = event_tx
                    .send(TurnEvent::Complete {
                        usage: outcome.usage.clone(),
                    })
                    .await;
            }
            Err(error) => {
                log::warn!("[{}] Turn aborted: {}", thread_id, error);
                if matches!(error, GraphError::Persistence(_)) {
                    let _ = event_tx
                        .send(TurnEvent::PersistenceError {
                            message: error.to_string(),
                        })
                        .await;
                }
                let _ = event_tx
                    .send(TurnEvent::Error {
                        message: error.to_string(),
                    })
                    .await;
            }
        }

        result
    }

    async fn drive(
        &self,
        thread_id: &str,
        user_message: &str,
        event_tx: &mpsc::Sender<TurnEvent>,
        cancel_token: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let mut messages = self.store.load(thread_id).await?;
        let prior_len = messages.len();
        messages.push(Message::user(user_message));

        let tool_schemas = if self.config.tools_enabled {
            self.tools.list_tools()
        } else {
            Vec::new()
        };

        log::debug!(
            "[{}] Starting turn: {} prior messages, {} tools",
            thread_id,
            prior_len,
            tool_schemas.len()
        );

        let mut usage = TokenUsage::default();
        let mut steps = 0usize;
        let mut node = GraphNode::Entry;

        while node != GraphNode::Exit {
            if cancel_token.is_cancelled() {
                return Err(GraphError::Cancelled);
            }

            node = match node {
                GraphNode::Entry => GraphNode::Chat,
                GraphNode::Chat => {
                    self.count_step(&mut steps)?;
                    let (reply, reported) = self
                        .chat_step(thread_id, &messages, &tool_schemas, event_tx, cancel_token)
                        .await?;
                    if let Some(reported) = reported {
                        usage.prompt_tokens += reported.prompt_tokens;
                        usage.completion_tokens += reported.completion_tokens;
                        usage.total_tokens += reported.total_tokens;
                    }
                    messages.push(reply);
                    self.commit(thread_id, &messages, event_tx).await?;
                    GraphNode::Route
                }
                GraphNode::Route => route(messages.last()),
                GraphNode::Tool => {
                    self.count_step(&mut steps)?;
                    let calls = messages
                        .last()
                        .map(|message| message.tool_calls().to_vec())
                        .unwrap_or_default();
                    let results = self
                        .tool_step(thread_id, &calls, event_tx, cancel_token)
                        .await?;
                    messages.extend(results);
                    self.commit(thread_id, &messages, event_tx).await?;
                    GraphNode::Chat
                }
                GraphNode::Exit => GraphNode::Exit,
            };
            log::debug!("[{}] -> {}", thread_id, node.as_str());
        }

        let reply = messages
            .last()
            .map(|message| message.content().to_string())
            .unwrap_or_default();

        Ok(TurnOutcome {
            thread_id: thread_id.to_string(),
            appended: messages.len() - prior_len,
            messages,
            reply,
            usage,
        })
    }

    /// Chat and tool steps share one budget per turn.
    fn count_step(&self, steps: &mut usize) -> Result<()> {
        *steps += 1;
        if *steps > self.config.max_steps {
            return Err(GraphError::StepLimit(self.config.max_steps));
        }
        Ok(())
    }

    async fn chat_step(
        &self,
        thread_id: &str,
        messages: &[Message],
        tool_schemas: &[ToolSchema],
        event_tx: &mpsc::Sender<TurnEvent>,
        cancel_token: &CancellationToken,
    ) -> Result<(Message, Option<TokenUsage>)> {
        let request: Vec<Message> = match &self.config.system_prompt {
            Some(prompt) => std::iter::once(Message::system(prompt.clone()))
                .chain(messages.iter().cloned())
                .collect(),
            None => messages.to_vec(),
        };

        let started = Instant::now();
        let stream = self
            .llm
            .chat_stream(&request, tool_schemas, self.config.max_output_tokens)
            .await?;
        let output = consume_llm_stream(stream, event_tx, cancel_token, thread_id).await?;

        log::debug!(
            "[{}] chat step ({}) finished in {}ms: {} chars, {} tool calls",
            thread_id,
            self.llm.model_name(),
            started.elapsed().as_millis(),
            output.content.len(),
            output.tool_calls.len()
        );

        // Without bound tools a tool request cannot be served; keep the text only.
        let tool_calls = if self.config.tools_enabled {
            output.tool_calls
        } else {
            Vec::new()
        };

        Ok((Message::assistant(output.content, tool_calls), output.usage))
    }

    async fn tool_step(
        &self,
        thread_id: &str,
        calls: &[threadchat_core::ToolCall],
        event_tx: &mpsc::Sender<TurnEvent>,
        cancel_token: &CancellationToken,
    ) -> Result<Vec<Message>> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            if cancel_token.is_cancelled() {
                return Err(GraphError::Cancelled);
            }

            let _ = event_tx
                .send(TurnEvent::ToolStart {
                    tool_call_id: call.id.clone(),
                    tool_name: call.function.name.clone(),
                    arguments: arguments_for_event(&call.function.arguments),
                })
                .await;

            let result = execute_tool_call(call, self.tools.as_ref()).await;
            log::info!(
                "[{}] Tool '{}' finished (success: {})",
                thread_id,
                call.function.name,
                result.success
            );

            results.push(Message::tool_result(
                call.id.clone(),
                call.function.name.clone(),
                result.to_content(),
            ));

            let _ = event_tx
                .send(TurnEvent::ToolComplete {
                    tool_call_id: call.id.clone(),
                    tool_name: call.function.name.clone(),
                    result,
                })
                .await;
        }

        Ok(results)
    }

    async fn commit(
        &self,
        thread_id: &str,
        messages: &[Message],
        event_tx: &mpsc::Sender<TurnEvent>,
    ) -> Result<()> {
        let checkpoint = self.store.save(thread_id, messages).await?;
        let _ = event_tx
            .send(TurnEvent::CheckpointSaved {
                thread_id: checkpoint.thread_id,
                step: checkpoint.step,
                message_count: checkpoint.messages.len(),
            })
            .await;
        Ok(())
    }
}
