use std::env;

pub const DEFAULT_NEWS_FEEDS: [&str; 3] = [
    // Reuters market news
    "https://www.reutersagency.com/feed/?best-topics=business-finance-market-news",
    // CNBC top news & analysis
    "https://www.cnbc.com/id/100003114/device/rss/rss.html",
    // Seeking Alpha market currents
    "https://seekingalpha.com/market_currents.xml",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialBackend {
    Keyring,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub storage: StorageBackend,
    pub mongodb_uri: String,
    pub mongodb_db: String,

    pub credentials: CredentialBackend,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,
    pub cookie_secure: bool,

    pub market_data_api_key: String,
    pub market_data_base_url: String,
    pub market_data_timeout_secs: u64,

    pub news_feeds: Vec<String>,
    // 0 disables the in-process poller
    pub news_poll_secs: u64,
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

    let port = env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let storage = match env::var("STORAGE_BACKEND").as_deref() {
        Ok("memory") => StorageBackend::Memory,
        _ => StorageBackend::Mongo,
    };

    let mongodb_uri = env::var("MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

    let mongodb_db = env::var("MONGODB_DB").unwrap_or_else(|_| "stocknear".to_string());

    let credentials = match env::var("CREDENTIAL_STORE").as_deref() {
        Ok("memory") => CredentialBackend::Memory,
        _ => CredentialBackend::Keyring,
    };

    let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-dev-secret".to_string());
    let jwt_cookie_name = env::var("JWT_COOKIE_NAME").unwrap_or_else(|_| "auth".to_string());
    let cookie_secure = env::var("COOKIE_SECURE")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    let market_data_api_key = env::var("FMP_API_KEY").unwrap_or_default();
    let market_data_base_url = env::var("FMP_BASE_URL")
        .unwrap_or_else(|_| "https://financialmodelingprep.com/api/v3".to_string());
    let market_data_timeout_secs = env::var("MARKET_DATA_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(10);

    let news_feeds = env::var("NEWS_FEEDS")
        .ok()
        .map(|raw| parse_feed_list(&raw))
        .filter(|feeds| !feeds.is_empty())
        .unwrap_or_else(|| DEFAULT_NEWS_FEEDS.iter().map(|s| s.to_string()).collect());

    let news_poll_secs = env::var("NEWS_POLL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    Settings {
        host,
        port,
        storage,
        mongodb_uri,
        mongodb_db,
        credentials,
        jwt_secret,
        jwt_cookie_name,
        cookie_secure,
        market_data_api_key,
        market_data_base_url,
        market_data_timeout_secs,
        news_feeds,
        news_poll_secs,
    }
}

fn parse_feed_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_list_skips_blank_entries() {
        let feeds = parse_feed_list(" https://a.example/rss , ,https://b.example/atom,");
        assert_eq!(feeds, vec!["https://a.example/rss", "https://b.example/atom"]);
    }
}
