//! Candle source interface consumed by the scanner.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Candle, Timeframe};

#[derive(Debug, Error)]
pub enum DataSourceError {
    /// Every configured source failed for this symbol.
    #[error("no candle data available for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response payload: {0}")]
    Decode(String),

    #[error("exchange returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("timeframe {0} is not supported by this source")]
    UnsupportedTimeframe(Timeframe),
}

impl DataSourceError {
    /// Network hiccups, rate limits and 5xx responses are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            DataSourceError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DataSourceError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Candles for one symbol plus the exchange that served them.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleBatch {
    pub candles: Vec<Candle>,
    pub exchange: String,
}

impl CandleBatch {
    pub fn new(candles: Vec<Candle>, exchange: impl Into<String>) -> Self {
        Self {
            candles,
            exchange: exchange.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Up to `limit` most recent candles, oldest first.
    ///
    /// An empty batch means the request succeeded but there is no history.
    /// `DataSourceError::Unavailable` means the data could not be fetched.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleBatch, DataSourceError>;
}
