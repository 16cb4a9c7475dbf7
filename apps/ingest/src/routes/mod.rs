pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/documents/:file_id/ingest",
            post(handlers::handle_ingest_document),
        )
        .route("/api/v1/jobs/ingest", post(handlers::handle_ingest_job))
        .with_state(state)
}
