use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use threadchat_core::TurnEvent;

use crate::reply::ReplyAssembler;
use crate::session::SessionError;
use crate::state::{spawn_sse_sender, AppState};

#[derive(Deserialize)]
pub struct TurnRequest {
    pub message: String,
}

/// Submit a user message to the active thread and stream the turn back as
/// server-sent events.
pub async fn handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<TurnRequest>,
) -> Result<HttpResponse, SessionError> {
    let session_id = path.into_inner();
    let message = body.into_inner().message;

    let thread_id = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        session.begin_turn(&message)?
    };
    log::info!("[{}] Turn started on thread {}", session_id, thread_id);

    let (sse_tx, mut sse_rx) = mpsc::channel::<Bytes>(100);
    let (event_tx, mut event_rx) = mpsc::channel::<TurnEvent>(100);
    let (relay_tx, relay_rx) = mpsc::channel::<TurnEvent>(100);

    let cancel_token = CancellationToken::new();
    state
        .cancel_tokens
        .write()
        .await
        .insert(session_id.clone(), cancel_token.clone());

    // Relay: keeps the session view in step with the turn, then forwards to SSE.
    tokio::spawn({
        let state = state.get_ref().clone();
        let session_id = session_id.clone();
        async move {
            let mut reply = ReplyAssembler::new();
            let mut event_count = 0usize;

            while let Some(event) = event_rx.recv().await {
                event_count += 1;
                reply.apply(&event);

                match &event {
                    TurnEvent::ToolStart { .. } | TurnEvent::ToolComplete { .. } => {
                        if let Some(status) = reply.status() {
                            log::debug!("[{}] {}", session_id, status);
                        }
                    }
                    TurnEvent::PersistenceError { .. } => {
                        if let Some(message) = reply.persistence_failure() {
                            log::error!("[{}] Checkpoint save failed: {}", session_id, message);
                        }
                    }
                    TurnEvent::Complete { usage } => {
                        log::info!(
                            "[{}] Stream completed: {} events, {} tokens, {} reply chars",
                            session_id,
                            event_count,
                            usage.total_tokens,
                            reply.text().chars().count()
                        );
                    }
                    TurnEvent::Error { .. } => {
                        log::error!(
                            "[{}] Stream error: {} ({} reply chars discarded)",
                            session_id,
                            reply.failure().unwrap_or("unknown"),
                            reply.text().chars().count()
                        );
                    }
                    _ => {}
                }

                // Release the session before the client sees the end of the turn.
                if event.is_terminal() {
                    release_session(&state, &session_id, &reply).await;
                }

                // The client may have gone away; keep draining so the turn
                // still finishes and commits.
                let _ = relay_tx.send(event).await;
            }

            if !reply.is_finished() {
                log::warn!("[{}] Turn ended without a terminal event", session_id);
                release_session(&state, &session_id, &reply).await;
            }
        }
    });

    let _sse_handle = spawn_sse_sender(relay_rx, sse_tx);

    tokio::spawn({
        let graph = state.graph.clone();
        async move {
            let _ = graph
                .run_turn(&thread_id, &message, &event_tx, &cancel_token)
                .await;
        }
    });

    Ok(HttpResponse::Ok()
        .append_header((header::CONTENT_TYPE, "text/event-stream"))
        .append_header((header::CACHE_CONTROL, "no-cache"))
        .append_header((header::CONNECTION, "keep-alive"))
        .streaming(async_stream::stream! {
            while let Some(item) = sse_rx.recv().await {
                yield Ok::<_, actix_web::Error>(item);
            }
        }))
}

async fn release_session(state: &AppState, session_id: &str, reply: &ReplyAssembler) {
    state.cancel_tokens.write().await.remove(session_id);

    let mut sessions = state.sessions.write().await;
    if let Some(session) = sessions.get_mut(session_id) {
        session.finish_turn(reply.completed_reply().map(str::to_string));
    }
}
