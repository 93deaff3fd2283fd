//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API under `/api`, serves uploaded image blobs
//! at `/uploads`, and wires CORS + request tracing for the whole app.

pub mod auth;
pub mod creators;
pub mod uploads;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let uploads_service = ServeDir::new(state.uploads.root());

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/creators", get(creators::list_creators).post(creators::create_creator))
        .route(
            "/api/creators/{id}",
            get(creators::get_creator)
                .patch(creators::update_creator)
                .delete(creators::delete_creator),
        )
        .route("/api/uploads/{folder}", post(uploads::upload_file))
        .route("/healthz", get(healthz))
        .nest_service("/uploads", uploads_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON error body shown to the user: `{"error": "..."}`.
pub(crate) fn error_json(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
