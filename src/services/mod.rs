pub mod market_data;
pub mod credential_store;
pub mod db_init;
pub mod rss;

pub mod auth_service;
pub mod user_service;
pub mod stocks_service;
pub mod news_service;
pub mod news_monitor;
pub mod integration_service;
