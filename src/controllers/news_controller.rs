use axum::{
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{
    models::CurrentUser,
    render,
    services::news_service::{self, FEED_PAGE_LIMIT},
    AppState,
};

pub async fn feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);

    let ctx = match news_service::feed_ctx(state.store.news.as_ref()).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("news feed query failed: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("db error: {e}"))).into_response();
        }
    };

    render::page(&state, &headers, StatusCode::OK, "News", "pages/news_feed", &ctx, user_ref)
}

pub async fn api_news(State(state): State<AppState>) -> Response {
    match state.store.news.latest(FEED_PAGE_LIMIT).await {
        Ok(items) => {
            let rows: Vec<_> = items
                .iter()
                .map(|n| {
                    json!({
                        "headline": n.headline,
                        "url": n.url,
                        "source": n.source,
                        "timestamp": news_service::rfc3339(n.timestamp),
                    })
                })
                .collect();
            Json(rows).into_response()
        }
        Err(e) => {
            error!("news api query failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
