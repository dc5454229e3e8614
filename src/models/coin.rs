use serde::{Deserialize, Serialize};

/// Coin universe entry, shaped like the cached market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinInfo {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub total_volume: f64,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_percentage_24h: Option<f64>,
}

impl CoinInfo {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            market_cap: 0.0,
            total_volume: 0.0,
            current_price: 0.0,
            price_change_percentage_24h: None,
        }
    }

    /// Exchange-facing ticker: upper-cased, trimmed.
    pub fn ticker(&self) -> String {
        self.symbol.trim().to_uppercase()
    }
}
