use serde::Serialize;

/// A listing row built from market-data responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub last_price: Option<f64>,
    pub change_percent: Option<f64>,
}

impl Stock {
    pub fn new(symbol: &str, name: &str, last_price: Option<f64>, change_percent: Option<f64>) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            name: name.trim().to_string(),
            last_price,
            change_percent,
        }
    }
}
