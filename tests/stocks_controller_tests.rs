mod common;

use axum::{http::StatusCode, routing::get as get_route, Router};
use mockito::Matcher;
use stocknear::{controllers::stocks_controller, AppState};
use tower::ServiceExt;

use common::{get, response_body_string, test_state, API_KEY};

const GAINERS: &str = r#"[
  {"symbol":"AAPL","name":"Apple Inc.","price":190.5,"change":3.1,"changesPercentage":1.65},
  {"symbol":"aal","name":"American Airlines","price":12.0,"change":0.4,"changesPercentage":3.45},
  {"symbol":"MSFT","name":"Microsoft","price":410.0,"change":5.0,"changesPercentage":1.23}
]"#;

fn stocks_app(state: AppState) -> Router {
    Router::new()
        .route("/stocks", get_route(stocks_controller::list))
        .route("/stocks/search", get_route(stocks_controller::search))
        .route("/stocks/overview", get_route(stocks_controller::overview))
        .route("/stocks/etf", get_route(stocks_controller::etf))
        .route("/stocks/:symbol", get_route(stocks_controller::detail))
        .route("/api/stocks", get_route(stocks_controller::api_stocks))
        .with_state(state)
}

/// `count` movers named `{prefix}000`, `{prefix}001`, ...
fn movers(prefix: &str, count: usize) -> Vec<serde_json::Value> {
    (0..count)
        .map(|i| {
            serde_json::json!({
                "symbol": format!("{prefix}{i:03}"),
                "name": format!("Company {i}"),
                "price": 10.0 + i as f64,
                "changesPercentage": 1.0,
            })
        })
        .collect()
}

async fn serve_json(server: &mut mockito::ServerGuard, path: &str, body: &serde_json::Value) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(apikey())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

fn apikey() -> Matcher {
    Matcher::UrlEncoded("apikey".into(), API_KEY.into())
}

#[tokio::test]
async fn list_without_api_key_renders_empty_table() {
    let app = stocks_app(test_state(None));

    let res = app.oneshot(get("/stocks")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains("No stocks to show right now."));
}

#[tokio::test]
async fn list_renders_gainers_with_uppercased_symbols() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/api/v3/stock_market/gainers")
        .match_query(apikey())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(GAINERS)
        .create_async()
        .await;

    let app = stocks_app(test_state(Some(&server.url())));
    let res = app.oneshot(get("/stocks")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    assert!(body.contains("/stocks/AAPL"));
    assert!(body.contains("/stocks/AAL"));
    assert!(body.contains("190.50"));
    m.assert_async().await;
}

#[tokio::test]
async fn search_is_case_insensitive_and_empty_query_returns_nothing() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/v3/stock_market/gainers")
        .match_query(apikey())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(GAINERS)
        .create_async()
        .await;

    let state = test_state(Some(&server.url()));

    let res = stocks_app(state.clone()).oneshot(get("/stocks/search?q=aa")).await.unwrap();
    let body = response_body_string(res).await;
    assert!(body.contains("/stocks/AAPL"));
    assert!(body.contains("/stocks/AAL"));
    assert!(!body.contains("/stocks/MSFT"));

    let res = stocks_app(state).oneshot(get("/stocks/search?q=")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_body_string(res).await;
    assert!(body.contains("No stocks to show right now."));
}

#[tokio::test]
async fn detail_uppercases_symbol_before_quoting() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/api/v3/quote/AAPL")
        .match_query(apikey())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"symbol":"AAPL","name":"Apple Inc.","price":190.5,"change":3.1,"changesPercentage":1.65,"exchange":"NASDAQ"}]"#)
        .expect(2)
        .create_async()
        .await;

    let state = test_state(Some(&server.url()));
    for path in ["/stocks/aapl", "/stocks/AAPL"] {
        let res = stocks_app(state.clone()).oneshot(get(path)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = response_body_string(res).await;
        assert!(body.contains("Apple Inc."));
        assert!(body.contains("NASDAQ"));
    }
    m.assert_async().await;
}

#[tokio::test]
async fn detail_unknown_symbol_is_404() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/v3/quote/ZZZZ")
        .match_query(apikey())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/stocks/zzzz"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detail_upstream_error_is_404() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/v3/quote/AAPL")
        .match_query(apikey())
        .with_status(500)
        .create_async()
        .await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/stocks/AAPL"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_stocks_returns_json_rows() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/v3/stock_market/gainers")
        .match_query(apikey())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(GAINERS)
        .create_async()
        .await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/api/stocks"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let rows: serde_json::Value = serde_json::from_str(&response_body_string(res).await).unwrap();
    assert_eq!(rows.as_array().map(|a| a.len()), Some(3));
    assert_eq!(rows[1]["symbol"], "AAL");
    assert_eq!(rows[0]["last_price"], 190.5);
}

#[tokio::test]
async fn list_is_capped_at_one_hundred_rows() {
    let mut server = mockito::Server::new_async().await;
    let _m = serve_json(&mut server, "/api/v3/stock_market/gainers", &movers("S", 150).into()).await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/api/stocks"))
        .await
        .unwrap();
    let rows: serde_json::Value = serde_json::from_str(&response_body_string(res).await).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 100);
    assert_eq!(rows[99]["symbol"], "S099");
}

#[tokio::test]
async fn search_looks_past_the_listing_cap() {
    let mut rows = movers("S", 150);
    rows.push(serde_json::json!({ "symbol": "ZZZZ", "name": "Sleepy Corp", "price": 1.0 }));

    let mut server = mockito::Server::new_async().await;
    let _m = serve_json(&mut server, "/api/v3/stock_market/gainers", &rows.into()).await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/stocks/search?q=zzzz"))
        .await
        .unwrap();
    let body = response_body_string(res).await;
    assert!(body.contains("/stocks/ZZZZ"));
}

#[tokio::test]
async fn search_results_are_capped_at_one_hundred() {
    let mut server = mockito::Server::new_async().await;
    let _m = serve_json(&mut server, "/api/v3/stock_market/gainers", &movers("S", 150).into()).await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/stocks/search?q=s"))
        .await
        .unwrap();
    let body = response_body_string(res).await;
    assert_eq!(body.matches(r#"href="/stocks/S"#).count(), 100);
}

#[tokio::test]
async fn overview_shows_ten_rows_per_list() {
    let mut server = mockito::Server::new_async().await;
    let _g = serve_json(&mut server, "/api/v3/stock_market/gainers", &movers("G", 25).into()).await;
    let _l = serve_json(&mut server, "/api/v3/stock_market/losers", &movers("L", 25).into()).await;
    let _a = serve_json(&mut server, "/api/v3/stock_market/actives", &movers("A", 25).into()).await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/stocks/overview"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_body_string(res).await;
    for prefix in ["G", "L", "A"] {
        assert_eq!(body.matches(&format!(r#"href="/stocks/{prefix}0"#)).count(), 10);
        assert!(!body.contains(&format!("/stocks/{prefix}010")));
    }
}

#[tokio::test]
async fn etf_list_is_capped_at_one_hundred_rows() {
    let etfs: Vec<_> = (0..130)
        .map(|i| serde_json::json!({ "symbol": format!("X{i:03}"), "name": "Fund", "price": 50.0, "exchangeShortName": "NYSE" }))
        .collect();

    let mut server = mockito::Server::new_async().await;
    let _m = serve_json(&mut server, "/api/v3/etf/list", &etfs.into()).await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/stocks/etf"))
        .await
        .unwrap();
    let body = response_body_string(res).await;
    assert_eq!(body.matches(r#"href="/stocks/X"#).count(), 100);
    assert!(body.contains("/stocks/X099"));
    assert!(!body.contains("/stocks/X100"));
}

#[tokio::test]
async fn detail_symbol_cannot_reach_other_endpoints() {
    let mut server = mockito::Server::new_async().await;
    let etf = server
        .mock("GET", Matcher::Regex(r"(?i)^/api/v3/etf/list$".into()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"symbol":"SPY","name":"SPDR"}]"#)
        .expect(0)
        .create_async()
        .await;

    let res = stocks_app(test_state(Some(&server.url())))
        .oneshot(get("/stocks/..%2Fetf%2Flist"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    etf.assert_async().await;
}
