use axum::{Router, routing::get};
use crate::{AppState, controllers::news_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/news", get(news_controller::feed))
        .route("/api/news", get(news_controller::api_news))
}
