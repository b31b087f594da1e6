//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Login opens a server-side session
        .route("/login", post(handlers::login::login))
        // Session-scoped chat
        .route("/sessions/{id}", get(handlers::chat::get_session))
        .route(
            "/sessions/{id}/messages",
            post(handlers::chat::send_message).get(handlers::chat::get_messages),
        )
        .route("/sessions/{id}/reset", post(handlers::chat::reset_session))
        .route("/sessions/{id}/logout", post(handlers::chat::logout))
        // Transcript download
        .route(
            "/sessions/{id}/export",
            get(handlers::export::export_transcript),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
