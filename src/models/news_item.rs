use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const HEADLINE_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub headline: String,

    // dedup key
    pub url: String,

    // unix seconds, UTC
    pub timestamp: i64,

    #[serde(default)]
    pub source: String,
}

impl NewsItem {
    pub fn new(headline: &str, url: &str, timestamp: i64, source: &str) -> Self {
        Self {
            id: ObjectId::new(),
            headline: headline.chars().take(HEADLINE_MAX_CHARS).collect(),
            url: url.to_string(),
            timestamp,
            source: source.to_string(),
        }
    }
}
