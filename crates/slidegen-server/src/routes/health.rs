//! Health check routes.

use axum::{extract::State, routing::get, Json, Router};

use crate::models::{BannerResponse, HealthResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
}

async fn banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Voice-to-Slide Generator API".to_string(),
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        jobs: state.service.counts(),
    })
}
