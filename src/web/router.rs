//! Router configuration.

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::ws::{relay_ws_handler, RelayState};

/// Create the relay router with the WebSocket endpoint at `ws_path`.
pub fn create_router(state: RelayState, ws_path: &str) -> Router {
    Router::new()
        .route(ws_path, get(relay_ws_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
