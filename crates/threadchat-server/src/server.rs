use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::handlers;
use crate::state::AppState;

/// Routes shared by the binary and the integration tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::ui::index)).service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health::handler))
            .route("/sessions", web::post().to(handlers::sessions::create))
            .route("/sessions/{session_id}", web::get().to(handlers::sessions::get))
            .route(
                "/sessions/{session_id}",
                web::delete().to(handlers::sessions::delete),
            )
            .route(
                "/sessions/{session_id}/threads",
                web::get().to(handlers::threads::list),
            )
            .route(
                "/sessions/{session_id}/threads",
                web::post().to(handlers::threads::create),
            )
            .route(
                "/sessions/{session_id}/threads/{thread_id}/select",
                web::post().to(handlers::threads::select),
            )
            .route(
                "/sessions/{session_id}/threads/{thread_id}/name",
                web::put().to(handlers::threads::rename),
            )
            .route(
                "/sessions/{session_id}/threads/{thread_id}/rename",
                web::post().to(handlers::threads::begin_rename),
            )
            .route(
                "/sessions/{session_id}/threads/{thread_id}/rename",
                web::delete().to(handlers::threads::cancel_rename),
            )
            .route(
                "/sessions/{session_id}/turn",
                web::post().to(handlers::turn::handler),
            )
            .route(
                "/sessions/{session_id}/stop",
                web::post().to(handlers::stop::handler),
            )
            .route("/threads", web::get().to(handlers::history::list_threads))
            .route(
                "/threads/{thread_id}/history",
                web::get().to(handlers::history::thread_history),
            ),
    );
}

pub async fn run_server(state: AppState, bind_address: &str) -> io::Result<()> {
    log::info!("Listening on http://{}", bind_address);
    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .configure(configure_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}
