//! Inbound HTTP surface for the service-hook.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/ado/tasks", post(handlers::ado_task_automation))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_function_key,
        ));

    Router::new()
        .route("/api/health", get(handlers::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
