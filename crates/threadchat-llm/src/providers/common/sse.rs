//! Event-stream plumbing shared by the streaming providers.

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Response;

use crate::provider::{LLMError, LLMStream, Result};
use crate::types::LLMChunk;

/// Adapt a `text/event-stream` response into an [`LLMStream`].
///
/// `parse` turns each event's `data` payload into zero or more chunks; an
/// empty vector drops the event. Errors surface as [`LLMError::Stream`].
/// Nothing is yielded after [`LLMChunk::Done`], even when the server keeps
/// the connection open.
pub fn llm_stream_from_sse<H>(response: Response, mut parse: H) -> LLMStream
where
    H: FnMut(&str) -> Result<Vec<LLMChunk>> + Send + 'static,
{
    let chunks = response.bytes_stream().eventsource().flat_map(move |event| {
        let items: Vec<Result<LLMChunk>> = match event {
            Ok(event) => match parse(&event.data) {
                Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                Err(error) => vec![Err(into_stream_error(error))],
            },
            Err(error) => vec![Err(LLMError::Stream(error.to_string()))],
        };
        futures::stream::iter(items)
    });

    let until_done = chunks.scan(false, |done, item| {
        let next = if *done {
            None
        } else {
            *done = matches!(item, Ok(LLMChunk::Done));
            Some(item)
        };
        futures::future::ready(next)
    });

    Box::pin(until_done)
}

fn into_stream_error(error: LLMError) -> LLMError {
    match error {
        LLMError::Stream(message) => LLMError::Stream(message),
        other => LLMError::Stream(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn network_tests_disabled() -> bool {
        std::env::var_os("THREADCHAT_SKIP_SOCKET_TESTS").is_some()
    }

    async fn serve(body: &'static str) -> (MockServer, Response) {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&mock_server)
            .await;

        let response = reqwest::Client::new()
            .get(format!("{}/events", mock_server.uri()))
            .send()
            .await
            .expect("response");

        (mock_server, response)
    }

    #[tokio::test]
    async fn dropped_events_are_skipped_and_nothing_follows_done() {
        if network_tests_disabled() {
            return;
        }

        let (_server, response) = serve(concat!(
            "data: hello\n\n",
            "data: skip\n\n",
            "data: a b\n\n",
            "data: [DONE]\n\n",
            "data: late\n\n",
        ))
        .await;

        let mut stream = llm_stream_from_sse(response, |data| match data {
            "skip" => Ok(Vec::new()),
            "[DONE]" => Ok(vec![LLMChunk::Done]),
            other => Ok(other
                .split(' ')
                .map(|word| LLMChunk::Token(word.to_string()))
                .collect()),
        });

        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            out.push(item.expect("chunk"));
        }

        assert_eq!(
            out,
            vec![
                LLMChunk::Token("hello".to_string()),
                LLMChunk::Token("a".to_string()),
                LLMChunk::Token("b".to_string()),
                LLMChunk::Done,
            ]
        );
    }

    #[tokio::test]
    async fn parse_failures_become_stream_errors() {
        if network_tests_disabled() {
            return;
        }

        let (_server, response) = serve("data: boom\n\n").await;

        let mut stream =
            llm_stream_from_sse(response, |_data| Err(LLMError::Api("boom".to_string())));

        let Some(item) = stream.next().await else {
            panic!("expected one stream item");
        };

        match item {
            Ok(chunk) => panic!("expected error, got chunk: {chunk:?}"),
            Err(LLMError::Stream(msg)) => assert!(msg.contains("API error")),
            Err(other) => panic!("expected LLMError::Stream, got: {other:?}"),
        }
    }
}
