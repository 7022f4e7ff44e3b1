//! Pulls the configured RSS feeds once and stores new items.

use std::{process::ExitCode, time::Duration};

use clap::Parser;
use mongodb::Client;
use tracing::error;
use tracing_subscriber::EnvFilter;

use stocknear::{
    config::{self, StorageBackend},
    services::{db_init, news_service},
    store::Store,
};

/// Fetch latest items from the RSS feeds and store them as news items
#[derive(Parser)]
#[command(name = "fetch_news", version, about, long_about = None)]
struct Cli {
    /// Feed URL to pull instead of the configured ones (repeatable)
    #[arg(long = "feed")]
    feeds: Vec<String>,

    /// Parse and report without storing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = config::load();

    let store = match settings.storage {
        StorageBackend::Mongo => {
            let db = match Client::with_uri_str(&settings.mongodb_uri).await {
                Ok(client) => client.database(&settings.mongodb_db),
                Err(e) => {
                    error!("mongodb connection failed: {e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = db_init::ensure_indexes(&db).await {
                error!("could not create indexes: {e}");
                return ExitCode::FAILURE;
            }
            Store::mongo(db)
        }
        StorageBackend::Memory => Store::memory(),
    };

    let feeds = if cli.feeds.is_empty() { settings.news_feeds.clone() } else { cli.feeds };

    let http = match news_service::feed_http_client(Duration::from_secs(settings.market_data_timeout_secs)) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match news_service::ingest(&http, store.news.as_ref(), &feeds, cli.dry_run).await {
        Ok(report) => {
            println!(
                "Done fetching RSS items: {} added, {} skipped ({} entries from {} feeds).",
                report.added, report.skipped, report.seen, report.feeds
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
