//! API route modules.

pub mod health;
pub mod jobs;
pub mod themes;

use axum::Router;

use crate::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(jobs::router())
        .merge(themes::router())
        .with_state(state)
}
