#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::http::{header, Request};
use http_body_util::BodyExt;
use mongodb::bson::oid::ObjectId;
use stocknear::{
    config::{self, CredentialBackend, StorageBackend},
    models::CurrentUser,
    services::{credential_store::MemoryCredentialStore, market_data::MarketDataClient},
    store::Store,
    templates, AppState,
};

pub const API_KEY: &str = "test-key";

/// App state on the memory store. `market_url` is a mock server root; without
/// one the market-data client has no key and every call short-circuits.
pub fn test_state(market_url: Option<&str>) -> AppState {
    let mut settings = config::load();
    settings.storage = StorageBackend::Memory;
    settings.credentials = CredentialBackend::Memory;
    settings.jwt_secret = "test-secret".into();
    settings.news_poll_secs = 0;

    let (base_url, key) = match market_url {
        Some(url) => (format!("{url}/api/v3"), API_KEY.to_string()),
        None => ("http://127.0.0.1:9/api/v3".to_string(), String::new()),
    };
    settings.market_data_base_url = base_url.clone();
    settings.market_data_api_key = key.clone();

    let market_data =
        MarketDataClient::new(&base_url, key, Duration::from_secs(5)).expect("market data client");

    AppState {
        hbs: templates::build_handlebars().expect("templates"),
        settings,
        store: Store::memory(),
        market_data,
        credentials: Arc::new(MemoryCredentialStore::default()),
    }
}

pub fn some_user() -> CurrentUser {
    CurrentUser {
        id: ObjectId::new(),
        username: "alice".into(),
        is_premium: false,
    }
}

pub fn form_post(uri: &str, body: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder().uri(uri).body(axum::body::Body::empty()).unwrap()
}

pub async fn response_body_string(res: axum::response::Response) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

pub fn location(res: &axum::response::Response) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
