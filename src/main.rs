use std::{net::SocketAddr, time::Duration};

use mongodb::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stocknear::{
    config::{self, StorageBackend},
    routes,
    services::{credential_store, db_init, market_data::MarketDataClient, news_monitor},
    store::Store,
    templates, AppState,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load();

    let store = match settings.storage {
        StorageBackend::Mongo => {
            let client = Client::with_uri_str(&settings.mongodb_uri).await?;
            let db = client.database(&settings.mongodb_db);
            db_init::ensure_indexes(&db).await?;
            Store::mongo(db)
        }
        StorageBackend::Memory => Store::memory(),
    };
    info!("storage backend: {}", store.backend_name());

    let market_data = MarketDataClient::new(
        &settings.market_data_base_url,
        settings.market_data_api_key.clone(),
        Duration::from_secs(settings.market_data_timeout_secs),
    )?;
    if !market_data.has_key() {
        tracing::warn!("FMP_API_KEY is not set; stock pages will be empty");
    }

    let state = AppState {
        hbs: templates::build_handlebars()?,
        settings: settings.clone(),
        store,
        market_data,
        credentials: credential_store::from_backend(settings.credentials),
    };

    news_monitor::spawn_news_poller(state.clone());

    let app = routes::app(state);

    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>()?, settings.port));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
