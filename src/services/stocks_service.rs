use serde_json::json;
use tracing::warn;

use crate::{
    error::Error,
    models::Stock,
    services::market_data::{MoverItem, Quote},
    AppState,
};

pub const LIST_LIMIT: usize = 100;
pub const OVERVIEW_LIMIT: usize = 10;
pub const ETF_LIMIT: usize = 100;

fn to_stock(it: MoverItem) -> Stock {
    Stock::new(
        &it.symbol,
        it.name.as_deref().unwrap_or(""),
        it.price,
        it.changes_percentage,
    )
}

fn log_failure(what: &str, err: &Error) {
    match err {
        Error::MissingApiKey => warn!("{what}: FMP_API_KEY is not set, returning no rows"),
        e => warn!("{what}: {e}"),
    }
}

/// Today's gainers, capped at `LIST_LIMIT`. Failures yield an empty list.
pub async fn gainers(state: &AppState) -> Vec<Stock> {
    match state.market_data.gainers().await {
        Ok(items) => items.into_iter().take(LIST_LIMIT).map(to_stock).collect(),
        Err(e) => {
            log_failure("gainers", &e);
            Vec::new()
        }
    }
}

/// Case-insensitive substring match of `query` against the symbol.
pub fn filter_by_symbol(stocks: Vec<Stock>, query: &str) -> Vec<Stock> {
    let q = query.trim().to_uppercase();
    if q.is_empty() {
        return Vec::new();
    }

    stocks
        .into_iter()
        .filter(|s| s.symbol.to_uppercase().contains(&q))
        .take(LIST_LIMIT)
        .collect()
}

/// Filters the full gainers response; only the matches are capped.
pub async fn search(state: &AppState, query: &str) -> Vec<Stock> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    match state.market_data.gainers().await {
        Ok(items) => filter_by_symbol(items.into_iter().map(to_stock).collect(), query),
        Err(e) => {
            log_failure("search", &e);
            Vec::new()
        }
    }
}

/// `None` means "render a 404": unknown symbol or any request failure.
pub async fn detail(state: &AppState, symbol: &str) -> Option<Quote> {
    let sym = symbol.trim().to_uppercase();
    if sym.is_empty() {
        return None;
    }

    match state.market_data.quote(&sym).await {
        Ok(q) => q,
        Err(e) => {
            log_failure(&format!("quote {sym}"), &e);
            None
        }
    }
}

async fn movers(state: &AppState, kind: &str) -> Vec<Stock> {
    let res = match kind {
        "losers" => state.market_data.losers().await,
        "actives" => state.market_data.actives().await,
        _ => state.market_data.gainers().await,
    };

    match res {
        Ok(items) => items.into_iter().take(OVERVIEW_LIMIT).map(to_stock).collect(),
        Err(e) => {
            log_failure(kind, &e);
            Vec::new()
        }
    }
}

pub async fn overview_ctx(state: &AppState) -> serde_json::Value {
    let (gainers, losers, actives) = tokio::join!(
        movers(state, "gainers"),
        movers(state, "losers"),
        movers(state, "actives"),
    );

    json!({
        "gainers": stock_rows(&gainers),
        "losers": stock_rows(&losers),
        "actives": stock_rows(&actives),
    })
}

pub async fn etf_ctx(state: &AppState) -> serde_json::Value {
    let rows: Vec<_> = match state.market_data.etf_list().await {
        Ok(items) => items
            .into_iter()
            .take(ETF_LIMIT)
            .map(|it| {
                json!({
                    "symbol": it.symbol.to_uppercase(),
                    "name": it.name.unwrap_or_default(),
                    "price": fmt_opt(it.price),
                    "exchange": it.exchange_short_name.or(it.exchange).unwrap_or_default(),
                })
            })
            .collect(),
        Err(e) => {
            log_failure("etf list", &e);
            Vec::new()
        }
    };

    json!({ "etfs": rows, "has_etfs": !rows.is_empty() })
}

pub fn fmt_opt(x: Option<f64>) -> String {
    x.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "—".to_string())
}

fn change_class(pct: Option<f64>) -> &'static str {
    match pct {
        Some(p) if p > 0.0 => "text-success",
        Some(p) if p < 0.0 => "text-danger",
        _ => "text-muted",
    }
}

pub fn stock_rows(stocks: &[Stock]) -> Vec<serde_json::Value> {
    stocks
        .iter()
        .map(|s| {
            json!({
                "symbol": s.symbol,
                "name": s.name,
                "last_price": fmt_opt(s.last_price),
                "change_percent": fmt_opt(s.change_percent),
                "change_class": change_class(s.change_percent),
            })
        })
        .collect()
}

pub fn quote_ctx(quote: &Quote) -> serde_json::Value {
    json!({
        "symbol": quote.symbol.to_uppercase(),
        "name": quote.name.clone().unwrap_or_default(),
        "price": fmt_opt(quote.price),
        "change": fmt_opt(quote.change),
        "change_percent": fmt_opt(quote.changes_percentage),
        "change_class": change_class(quote.changes_percentage),
        "open": fmt_opt(quote.open),
        "previous_close": fmt_opt(quote.previous_close),
        "day_low": fmt_opt(quote.day_low),
        "day_high": fmt_opt(quote.day_high),
        "year_low": fmt_opt(quote.year_low),
        "year_high": fmt_opt(quote.year_high),
        "market_cap": fmt_opt(quote.market_cap),
        "volume": fmt_opt(quote.volume),
        "avg_volume": fmt_opt(quote.avg_volume),
        "pe": fmt_opt(quote.pe),
        "eps": fmt_opt(quote.eps),
        "exchange": quote.exchange.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<Stock> {
        vec![
            Stock::new("AAPL", "Apple", Some(1.0), Some(2.0)),
            Stock::new("AAL", "American Airlines", None, None),
            Stock::new("MSFT", "Microsoft", None, Some(-1.0)),
        ]
    }

    #[test]
    fn filter_matches_symbol_substring_in_any_case() {
        let hits: Vec<_> = filter_by_symbol(listing(), "aa")
            .into_iter()
            .map(|s| s.symbol)
            .collect();
        assert_eq!(hits, vec!["AAPL", "AAL"]);

        let hits = filter_by_symbol(listing(), "Sf");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol, "MSFT");
    }

    #[test]
    fn filter_ignores_names_and_blank_queries() {
        assert!(filter_by_symbol(listing(), "apple").is_empty());
        assert!(filter_by_symbol(listing(), "   ").is_empty());
    }

    #[test]
    fn rows_format_prices_and_colour_changes() {
        let rows = stock_rows(&listing());
        assert_eq!(rows[0]["last_price"], "1.00");
        assert_eq!(rows[0]["change_class"], "text-success");
        assert_eq!(rows[1]["last_price"], "—");
        assert_eq!(rows[2]["change_class"], "text-danger");
    }
}
