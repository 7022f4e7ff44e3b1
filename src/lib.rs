//! Library entrypoint for stocknear.
//!
//! The binaries (`stocknear`, `fetch_news`) and the integration tests under
//! `tests/` build on the app state, routers, controllers and services here.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod store;

#[path = "middleware/auth.rs"]
pub mod auth;

pub mod services;

#[path = "views/render.rs"]
pub mod render;
#[path = "views/templates.rs"]
pub mod templates;

pub mod controllers;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub hbs: templates::Hbs,
    pub settings: config::Settings,
    pub store: store::Store,
    pub market_data: services::market_data::MarketDataClient,
    pub credentials: Arc<dyn services::credential_store::CredentialStore>,
}
