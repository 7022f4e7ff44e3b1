use axum::{Router, routing::get};
use crate::{AppState, controllers::stocks_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/stocks", get(stocks_controller::list))
        .route("/stocks/search", get(stocks_controller::search))
        .route("/stocks/overview", get(stocks_controller::overview))
        .route("/stocks/etf", get(stocks_controller::etf))
        .route("/stocks/calendar", get(stocks_controller::calendar))
        .route("/stocks/:symbol", get(stocks_controller::detail))
        .route("/api/stocks", get(stocks_controller::api_stocks))
}
