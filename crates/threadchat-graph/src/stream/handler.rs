use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use threadchat_core::tools::{ToolCall, ToolCallAccumulator};
use threadchat_core::{TokenUsage, TurnEvent};
use threadchat_llm::{LLMChunk, LLMStream};

use crate::error::GraphError;

pub struct StreamHandlingOutput {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
}

/// Drain one model response, forwarding text fragments as they arrive and
/// merging tool-call fragments into complete calls.
pub async fn consume_llm_stream(
    mut stream: LLMStream,
    event_tx: &mpsc::Sender<TurnEvent>,
    cancel_token: &CancellationToken,
    thread_id: &str,
) -> Result<StreamHandlingOutput, GraphError> {
    let mut content = String::new();
    let mut tool_calls = ToolCallAccumulator::new();
    let mut usage = None;

    loop {
        let chunk_result = tokio::select! {
            _ = cancel_token.cancelled() => return Err(GraphError::Cancelled),
            next = stream.next() => match next {
                Some(chunk_result) => chunk_result,
                None => break,
            },
        };

        match chunk_result {
            Ok(LLMChunk::Token(token)) => {
                if token.is_empty() {
                    continue;
                }
                content.push_str(&token);

                // A closed receiver means nobody is watching; keep going so the
                // step still commits.
                let _ = event_tx.send(TurnEvent::Token { content: token }).await;
            }
            Ok(LLMChunk::ToolCalls(deltas)) => {
                log::debug!("[{}] Received {} tool call parts", thread_id, deltas.len());
                tool_calls.extend(deltas);
            }
            Ok(LLMChunk::Usage(reported)) => {
                usage = Some(reported);
            }
            Ok(LLMChunk::Done) => {
                log::debug!("[{}] LLM stream completed", thread_id);
                break;
            }
            Err(error) => {
                log::error!("[{}] LLM stream failed: {}", thread_id, error);
                return Err(GraphError::Upstream(error));
            }
        }
    }

    Ok(StreamHandlingOutput {
        content,
        tool_calls: tool_calls.finalize(),
        usage,
    })
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use threadchat_core::ToolCallDelta;
    use threadchat_llm::LLMError;

    use super::*;

    fn build_stream(items: Vec<Result<LLMChunk, LLMError>>) -> LLMStream {
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn consume_llm_stream_accumulates_tokens_and_tool_calls() {
        let stream = build_stream(vec![
            Ok(LLMChunk::Token("hi".to_string())),
            Ok(LLMChunk::ToolCalls(vec![ToolCallDelta {
                index: 0,
                id: Some("call_1".to_string()),
                name: Some("calculator".to_string()),
                arguments: Some("{".to_string()),
            }])),
            Ok(LLMChunk::ToolCalls(vec![ToolCallDelta {
                index: 0,
                arguments: Some("}".to_string()),
                ..Default::default()
            }])),
            Ok(LLMChunk::Done),
        ]);

        let (event_tx, mut event_rx) = mpsc::channel::<TurnEvent>(8);
        let output = consume_llm_stream(stream, &event_tx, &CancellationToken::new(), "thread-1")
            .await
            .expect("stream should succeed");

        assert_eq!(output.content, "hi");
        assert_eq!(output.tool_calls.len(), 1);
        assert_eq!(output.tool_calls[0].function.name, "calculator");
        assert_eq!(output.tool_calls[0].function.arguments, "{}");

        let token_event = event_rx.recv().await.expect("missing token event");
        assert_eq!(
            token_event,
            TurnEvent::Token {
                content: "hi".to_string()
            }
        );
    }

    #[tokio::test]
    async fn stream_error_is_upstream_failure() {
        let stream = build_stream(vec![
            Ok(LLMChunk::Token("partial".to_string())),
            Err(LLMError::Stream("connection reset".to_string())),
        ]);

        let (event_tx, _event_rx) = mpsc::channel::<TurnEvent>(8);
        let result =
            consume_llm_stream(stream, &event_tx, &CancellationToken::new(), "thread-1").await;

        assert!(matches!(result, Err(GraphError::Upstream(_))));
    }

    #[tokio::test]
    async fn cancelled_token_stops_consumption() {
        let stream: LLMStream = Box::pin(stream::pending());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (event_tx, _event_rx) = mpsc::channel::<TurnEvent>(8);
        let result = consume_llm_stream(stream, &event_tx, &cancel, "thread-1").await;

        assert!(matches!(result, Err(GraphError::Cancelled)));
    }
}
