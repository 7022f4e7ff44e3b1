use axum::{
    extract::{Extension, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{models::CurrentUser, render, services::stocks_service, AppState};

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    let stocks = stocks_service::gainers(&state).await;

    render::page(
        &state,
        &headers,
        StatusCode::OK,
        "Stocks",
        "pages/stock_list",
        &json!({
            "heading": "Top gainers",
            "query": "",
            "stocks": stocks_service::stock_rows(&stocks),
        }),
        user_ref,
    )
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    let query = params.q.trim().to_string();
    let stocks = stocks_service::search(&state, &query).await;

    render::page(
        &state,
        &headers,
        StatusCode::OK,
        "Search",
        "pages/stock_list",
        &json!({
            "heading": "Search",
            "query": query,
            "stocks": stocks_service::stock_rows(&stocks),
        }),
        user_ref,
    )
}

pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
    Path(symbol): Path<String>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);

    let Some(quote) = stocks_service::detail(&state, &symbol).await else {
        return render::not_found_page(&state, &headers, user_ref);
    };

    let ctx = json!({ "quote": stocks_service::quote_ctx(&quote) });
    let title = quote.symbol.to_uppercase();
    render::page(&state, &headers, StatusCode::OK, &title, "pages/stock_detail", &ctx, user_ref)
}

pub async fn overview(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    let ctx = stocks_service::overview_ctx(&state).await;
    render::page(&state, &headers, StatusCode::OK, "Market overview", "pages/stock_overview", &ctx, user_ref)
}

pub async fn etf(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    let ctx = stocks_service::etf_ctx(&state).await;
    render::page(&state, &headers, StatusCode::OK, "ETFs", "pages/etf_list", &ctx, user_ref)
}

pub async fn calendar(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let user_ref = user.as_ref().map(|Extension(u)| u);
    render::page(&state, &headers, StatusCode::OK, "Calendar", "pages/calendar", &json!({}), user_ref)
}

/// JSON view of the gainers listing.
pub async fn api_stocks(State(state): State<AppState>) -> impl IntoResponse {
    Json(stocks_service::gainers(&state).await)
}
