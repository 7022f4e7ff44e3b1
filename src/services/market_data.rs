use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Client for the Financial Modeling Prep style REST API.
#[derive(Clone)]
pub struct MarketDataClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl MarketDataClient {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Appends `segments` to the base url, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::MarketData(format!("bad base url {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| Error::MarketData(format!("bad base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        if !self.has_key() {
            return Err(Error::MissingApiKey);
        }

        let path = segments.join("/");
        let url = self.endpoint(segments)?;
        let res = self
            .http
            .get(url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(Error::MarketData(format!("{path}: {status} {body}")));
        }

        Ok(res.json::<T>().await?)
    }

    pub async fn gainers(&self) -> Result<Vec<MoverItem>> {
        self.get_json(&["stock_market", "gainers"]).await
    }

    pub async fn losers(&self) -> Result<Vec<MoverItem>> {
        self.get_json(&["stock_market", "losers"]).await
    }

    pub async fn actives(&self) -> Result<Vec<MoverItem>> {
        self.get_json(&["stock_market", "actives"]).await
    }

    pub async fn etf_list(&self) -> Result<Vec<EtfItem>> {
        self.get_json(&["etf", "list"]).await
    }

    /// `Ok(None)` when the provider knows nothing about the symbol.
    pub async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        // dot segments would be dropped from the path
        if symbol.is_empty() || matches!(symbol, "." | "..") {
            return Ok(None);
        }
        let quotes: Vec<Quote> = self.get_json(&["quote", symbol]).await?;
        Ok(quotes.into_iter().next())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoverItem {
    pub symbol: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub change: Option<f64>,

    #[serde(default, rename = "changesPercentage")]
    pub changes_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EtfItem {
    pub symbol: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub exchange: Option<String>,

    #[serde(default, rename = "exchangeShortName")]
    pub exchange_short_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub changes_percentage: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub day_low: Option<f64>,
    #[serde(default)]
    pub day_high: Option<f64>,
    #[serde(default)]
    pub year_high: Option<f64>,
    #[serde(default)]
    pub year_low: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub price_avg50: Option<f64>,
    #[serde(default)]
    pub price_avg200: Option<f64>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub avg_volume: Option<f64>,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub pe: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    // unix seconds
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_tolerates_missing_and_null_fields() {
        let raw = r#"[{"symbol":"AAPL","name":"Apple Inc.","price":189.3,"changesPercentage":1.2,
            "dayLow":null,"yearHigh":199.62,"marketCap":2950000000000,"priceAvg50":180.1,
            "previousClose":187.0,"timestamp":1700000000}]"#;

        let quotes: Vec<Quote> = serde_json::from_str(raw).unwrap();
        let q = &quotes[0];
        assert_eq!(q.symbol, "AAPL");
        assert_eq!(q.price, Some(189.3));
        assert_eq!(q.changes_percentage, Some(1.2));
        assert_eq!(q.day_low, None);
        assert_eq!(q.price_avg50, Some(180.1));
        assert_eq!(q.timestamp, Some(1_700_000_000));
    }

    #[test]
    fn symbol_stays_a_single_path_segment() {
        let client =
            MarketDataClient::new("https://fmp.example/api/v3/", "k".into(), Duration::from_secs(1)).unwrap();

        let url = client.endpoint(&["quote", "../etf/list"]).unwrap();
        assert_eq!(url.as_str(), "https://fmp.example/api/v3/quote/..%2Fetf%2Flist");

        let url = client.endpoint(&["quote", "BRK.B?x=1#y"]).unwrap();
        assert_eq!(url.path(), "/api/v3/quote/BRK.B%3Fx=1%23y");
        assert_eq!(url.query(), None);
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let client = MarketDataClient::new("http://127.0.0.1:9", String::new(), Duration::from_secs(1)).unwrap();
        assert!(matches!(client.gainers().await, Err(Error::MissingApiKey)));
        assert!(matches!(client.quote("AAPL").await, Err(Error::MissingApiKey)));
    }
}
