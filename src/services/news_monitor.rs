use std::time::Duration;

use tokio::time;
use tracing::{error, info};

use crate::{services::news_service, AppState};

/// Runs the news ingestion on a fixed interval. Nothing is spawned when the
/// interval is zero.
pub fn spawn_news_poller(state: AppState) {
    let every = state.settings.news_poll_secs;
    if every == 0 {
        return;
    }

    info!("[news-poller] pulling {} feeds every {}s", state.settings.news_feeds.len(), every);

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(every));
        let http = match news_service::feed_http_client(Duration::from_secs(
            state.settings.market_data_timeout_secs,
        )) {
            Ok(c) => c,
            Err(e) => {
                error!("[news-poller] could not build http client: {e}");
                return;
            }
        };

        loop {
            interval.tick().await;

            if let Err(e) = news_service::ingest(
                &http,
                state.store.news.as_ref(),
                &state.settings.news_feeds,
                false,
            )
            .await
            {
                error!("[news-poller] run aborted: {e}");
            }
        }
    });
}
