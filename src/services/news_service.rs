use std::{collections::HashSet, time::Duration};

use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    models::NewsItem,
    services::rss::{self, FeedEntry},
    store::NewsRepository,
};

pub const FEED_PAGE_LIMIT: usize = 50;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub feeds: usize,
    pub seen: usize,
    pub added: usize,
    pub skipped: usize,
}

pub fn feed_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("stocknear-news/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

pub async fn fetch_feed(http: &Client, feed_url: &str) -> Result<Vec<FeedEntry>> {
    let res = http.get(feed_url).send().await?;

    if !res.status().is_success() {
        return Err(Error::Feed {
            url: feed_url.to_string(),
            reason: format!("HTTP {}", res.status()),
        });
    }

    let body = res.text().await?;
    rss::parse_feed(&body).map_err(|reason| Error::Feed {
        url: feed_url.to_string(),
        reason,
    })
}

/// Only absolute http(s) links are stored; they end up in an `href`.
pub fn is_web_link(link: &str) -> bool {
    url::Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Host part of the link, stored as the item's source.
pub fn source_of(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Pulls every feed in order and stores entries whose url is new.
///
/// The first feed that cannot be fetched or parsed aborts the run; items
/// stored before that point stay stored. With `dry_run` nothing is written.
pub async fn ingest(
    http: &Client,
    news: &dyn NewsRepository,
    feeds: &[String],
    dry_run: bool,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();
    // urls a dry run would have stored, so repeats are still counted as skips
    let mut pending: HashSet<String> = HashSet::new();

    for feed_url in feeds {
        info!("Pulling feed: {feed_url}");
        let entries = fetch_feed(http, feed_url).await?;
        report.feeds += 1;

        for entry in entries {
            report.seen += 1;

            let link = entry.link.trim();
            let title = entry.title.trim();
            if link.is_empty() || title.is_empty() {
                report.skipped += 1;
                continue;
            }

            if !is_web_link(link) {
                debug!("  skipping non-web link {link}");
                report.skipped += 1;
                continue;
            }

            if news.exists_by_url(link).await? {
                report.skipped += 1;
                continue;
            }

            let published = entry.published.unwrap_or_else(Utc::now);
            let item = NewsItem::new(title, link, published.timestamp(), &source_of(link));

            if dry_run {
                if !pending.insert(link.to_string()) {
                    report.skipped += 1;
                    continue;
                }
                info!("  would add: {}", preview(title));
                report.added += 1;
                continue;
            }

            match news.insert(&item).await {
                Ok(()) => {
                    info!("  added: {}", preview(title));
                    report.added += 1;
                }
                Err(Error::Duplicate(_)) => {
                    debug!("  raced on {link}, already stored");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    info!(
        "Done fetching RSS items: {} feeds, {} seen, {} added, {} skipped",
        report.feeds, report.seen, report.added, report.skipped
    );
    Ok(report)
}

fn preview(title: &str) -> String {
    let mut s: String = title.chars().take(60).collect();
    if title.chars().count() > 60 {
        s.push_str("...");
    }
    s
}

pub async fn feed_ctx(news: &dyn NewsRepository) -> Result<serde_json::Value> {
    let items = news.latest(FEED_PAGE_LIMIT).await?;

    let rows: Vec<_> = items
        .iter()
        .map(|n| {
            json!({
                "headline": n.headline,
                "url": n.url,
                "source": n.source,
                "published": fmt_timestamp(n.timestamp),
            })
        })
        .collect();

    Ok(json!({ "items": rows, "has_items": !rows.is_empty() }))
}

pub fn fmt_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default()
}

pub fn rfc3339(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_is_link_host() {
        assert_eq!(source_of("https://www.cnbc.com/2025/06/10/markets.html"), "www.cnbc.com");
        assert_eq!(source_of("not a url"), "");
    }

    #[test]
    fn only_http_links_count_as_web_links() {
        assert!(is_web_link("https://www.cnbc.com/a"));
        assert!(is_web_link("http://example.com"));
        assert!(!is_web_link("javascript:alert(1)"));
        assert!(!is_web_link("data:text/html,hi"));
        assert!(!is_web_link("/relative/path"));
    }

    #[test]
    fn preview_cuts_long_titles() {
        let long = "x".repeat(80);
        assert_eq!(preview(&long).len(), 63);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(fmt_timestamp(0), "1970-01-01 00:00 UTC");
        assert_eq!(rfc3339(0), "1970-01-01T00:00:00+00:00");
    }
}
