use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all PVL endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/actors", post(handler::register_actor))
        .route("/v1/actors/:id", get(handler::get_actor))
        .route("/v1/actors/:id/batches", get(handler::actor_batches))
        .route("/v1/actors/:id/entries", get(handler::actor_entries))
        .route("/v1/actors/:id/tokens", post(handler::issue_token))
        .route("/v1/batches", post(handler::create_batch))
        .route("/v1/batches/:id", get(handler::get_batch))
        .route("/v1/batches/:id/transitions", post(handler::transition))
        .route("/v1/batches/:id/history", get(handler::history))
        .route("/v1/batches/:id/verify", get(handler::verify))
        .route("/v1/lookup/:key", get(handler::lookup_batch))
        .route("/v1/stats", get(handler::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
