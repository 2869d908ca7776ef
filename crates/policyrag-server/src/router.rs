use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{ask_handler, ask_routed_handler, health_handler};
use crate::server::AppState;

pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    let ask = Router::new()
        .route("/ask", post(ask_handler))
        .route("/ask/routed", post(ask_routed_handler))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new().route("/health", get(health_handler)).merge(ask).layer(TraceLayer::new_for_http()).with_state(state)
}
