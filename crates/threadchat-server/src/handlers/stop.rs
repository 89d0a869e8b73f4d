use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct StopResponse {
    pub success: bool,
    pub message: String,
}

/// Cancel the turn running for a session. Whatever was committed before the
/// cancellation stays committed.
pub async fn handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let session_id = path.into_inner();

    let token = state.cancel_tokens.read().await.get(&session_id).cloned();
    match token {
        Some(token) => {
            token.cancel();
            log::info!("[{}] Turn cancellation requested", session_id);
            HttpResponse::Ok().json(StopResponse {
                success: true,
                message: "Turn stopped".to_string(),
            })
        }
        None => {
            log::warn!("[{}] No running turn to stop", session_id);
            HttpResponse::NotFound().json(StopResponse {
                success: false,
                message: "No running turn found".to_string(),
            })
        }
    }
}
