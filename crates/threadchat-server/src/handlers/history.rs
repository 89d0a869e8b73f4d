use actix_web::{web, HttpResponse};

use crate::session::SessionError;
use crate::state::AppState;

/// Every thread with at least one committed checkpoint.
pub async fn list_threads(state: web::Data<AppState>) -> Result<HttpResponse, SessionError> {
    let threads = state.store().list_threads().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "threads": threads })))
}

/// Latest committed messages of a thread, tool traffic included.
pub async fn thread_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, SessionError> {
    let thread_id = path.into_inner();
    let messages = state.store().load(&thread_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "thread_id": thread_id,
        "messages": messages,
    })))
}
