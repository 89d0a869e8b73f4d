//! OpenAI-compatible request serialization and stream chunk parsing.
//!
//! OpenAI, OpenRouter and most self-hosted gateways accept this request shape.
//! Internal [`Message`] fields (`id`, `created_at`) never reach the wire.

use serde::Deserialize;
use serde_json::{json, Value};
use threadchat_core::{Message, MessageBody, TokenUsage, ToolCallDelta, ToolSchema};

use crate::provider::Result;
use crate::types::LLMChunk;

/// Convert internal [`Message`] values to an OpenAI-compatible JSON array.
pub fn messages_to_openai_compat_json(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| match &m.body {
            MessageBody::System { content } => json!({ "role": "system", "content": content }),
            MessageBody::User { content } => json!({ "role": "user", "content": content }),
            MessageBody::Assistant {
                content,
                tool_calls,
            } => {
                if tool_calls.is_empty() {
                    json!({ "role": "assistant", "content": content })
                } else {
                    let content = if content.is_empty() {
                        Value::Null
                    } else {
                        json!(content)
                    };
                    json!({
                        "role": "assistant",
                        "content": content,
                        "tool_calls": tool_calls,
                    })
                }
            }
            MessageBody::Tool {
                tool_call_id,
                name,
                content,
            } => json!({
                "role": "tool",
                "tool_call_id": tool_call_id,
                "name": name,
                "content": content,
            }),
        })
        .collect()
}

/// Build a streaming chat request body. `tools` is omitted when empty.
pub fn build_openai_compat_body(
    model: &str,
    messages: &[Message],
    tools: &[ToolSchema],
    max_output_tokens: Option<u32>,
) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages_to_openai_compat_json(messages),
        "stream": true,
        "stream_options": { "include_usage": true },
    });

    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    if let Some(max_tokens) = max_output_tokens {
        body["max_tokens"] = json!(max_tokens);
    }

    body
}

// --- OpenAI-compatible streaming chunk parsing ---

#[derive(Debug, Deserialize)]
pub struct OpenAICompatStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAICompatChoice>,
    usage: Option<OpenAICompatUsage>,
    error: Option<OpenAICompatError>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatChoice {
    #[serde(default)]
    delta: OpenAICompatDelta,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAICompatDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAICompatToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatToolCallDelta {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<OpenAICompatFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAICompatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// Mid-stream error object some gateways (OpenRouter) send instead of a chunk.
#[derive(Debug, Deserialize)]
struct OpenAICompatError {
    message: String,
}

/// Convert a single stream chunk into [`LLMChunk`]s. One chunk may carry a
/// content fragment, tool call deltas and usage at once; they come out in
/// that order. Keep-alive chunks yield nothing.
pub fn parse_openai_compat_chunk(chunk: OpenAICompatStreamChunk) -> Vec<LLMChunk> {
    let mut out = Vec::new();

    if let Some(choice) = chunk.choices.into_iter().next() {
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            out.push(LLMChunk::Token(content));
        }

        let deltas: Vec<ToolCallDelta> = choice
            .delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let (name, arguments) = match tc.function {
                    Some(f) => (f.name, f.arguments),
                    None => (None, None),
                };
                ToolCallDelta {
                    index: tc.index,
                    id: tc.id,
                    name,
                    arguments,
                }
            })
            .collect();
        if !deltas.is_empty() {
            out.push(LLMChunk::ToolCalls(deltas));
        }
    }

    if let Some(usage) = chunk.usage {
        out.push(LLMChunk::Usage(TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }));
    }

    out
}

/// Parse an SSE `data:` payload.
///
/// - `"[DONE]"` -> `LLMChunk::Done`
/// - invalid JSON or an embedded `error` object -> error
pub fn parse_openai_compat_sse_data(data: &str) -> Result<Vec<LLMChunk>> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data == "[DONE]" {
        return Ok(vec![LLMChunk::Done]);
    }

    let chunk: OpenAICompatStreamChunk = serde_json::from_str(data)?;
    if let Some(error) = &chunk.error {
        return Err(crate::provider::LLMError::Api(error.message.clone()));
    }
    Ok(parse_openai_compat_chunk(chunk))
}
