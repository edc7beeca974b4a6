use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::models::ThemesResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/themes", get(list_themes))
}

async fn list_themes(State(state): State<AppState>) -> impl IntoResponse {
    Json(ThemesResponse {
        themes: state.service.themes(),
        default: state.service.default_theme_id(),
    })
    .into_response()
}
