use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
};
use serde_json::json;

use crate::{models::CurrentUser, render, AppState};

pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> impl IntoResponse {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::page(&state, &headers, StatusCode::OK, "Home", "pages/home", &json!({}), user_ref)
}

pub async fn not_found(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> impl IntoResponse {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::not_found_page(&state, &headers, user_ref)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Html("ok".to_string()))
}

pub async fn health_db(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.store.backend_name();
    match state.store.ping().await {
        Ok(_) => (StatusCode::OK, Html(format!("{backend}: ok"))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!("{backend} error: {}", e)),
        )
            .into_response(),
    }
}
