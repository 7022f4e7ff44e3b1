//! Minimal RSS 2.0 / Atom reader: just enough to pull link, title and
//! publication time out of each entry.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
}

#[derive(Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

/// RFC 2822 (RSS) first, then RFC 3339 (Atom).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, String> {
    let rss_err = match quick_xml::de::from_str::<Rss>(xml) {
        Ok(rss) => {
            return Ok(rss
                .channel
                .items
                .into_iter()
                .map(|it| FeedEntry {
                    title: it.title.unwrap_or_default(),
                    link: it.link.unwrap_or_default(),
                    published: it.pub_date.as_deref().and_then(parse_date),
                })
                .collect());
        }
        Err(e) => e,
    };

    match quick_xml::de::from_str::<AtomFeed>(xml) {
        Ok(feed) if xml.contains("<feed") => Ok(feed
            .entries
            .into_iter()
            .map(|e| {
                let link = e
                    .links
                    .iter()
                    .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                    .or_else(|| e.links.first())
                    .map(|l| l.href.clone())
                    .unwrap_or_default();

                FeedEntry {
                    title: e.title.map(|t| t.value).unwrap_or_default(),
                    link,
                    published: e
                        .published
                        .as_deref()
                        .or(e.updated.as_deref())
                        .and_then(parse_date),
                }
            })
            .collect()),
        _ => Err(rss_err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Market News</title>
    <link>https://news.example.com</link>
    <atom:link href="https://news.example.com/rss" rel="self"/>
    <item>
      <title><![CDATA[Stocks rally & yields fall]]></title>
      <link>https://news.example.com/a</link>
      <pubDate>Tue, 10 Jun 2025 14:30:00 GMT</pubDate>
    </item>
    <item>
      <title>No date here</title>
      <link>https://news.example.com/b</link>
    </item>
    <item>
      <title>Odd date</title>
      <link>https://news.example.com/c</link>
      <pubDate>yesterday-ish</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <entry>
    <title type="html">Fed holds rates</title>
    <link rel="edit" href="https://atom.example.com/edit/1"/>
    <link rel="alternate" href="https://atom.example.com/1"/>
    <updated>2025-06-11T08:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn reads_rss_items() {
        let entries = parse_feed(RSS).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].title, "Stocks rally & yields fall");
        assert_eq!(entries[0].link, "https://news.example.com/a");
        assert_eq!(
            entries[0].published,
            Some(Utc.with_ymd_and_hms(2025, 6, 10, 14, 30, 0).unwrap())
        );

        assert_eq!(entries[1].published, None);
        assert_eq!(entries[2].published, None);
    }

    #[test]
    fn reads_atom_entries() {
        let entries = parse_feed(ATOM).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Fed holds rates");
        assert_eq!(entries[0].link, "https://atom.example.com/1");
        assert_eq!(
            entries[0].published,
            Some(Utc.with_ymd_and_hms(2025, 6, 11, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_non_feed_documents() {
        assert!(parse_feed("<html><body>nope</body></html>").is_err());
        assert!(parse_feed("not xml at all").is_err());
    }

    #[test]
    fn parses_both_date_styles() {
        assert!(parse_date("Mon, 02 Jun 2025 09:15:00 +0000").is_some());
        assert!(parse_date("2025-06-02T09:15:00+02:00").is_some());
        assert!(parse_date("").is_none());
    }
}
