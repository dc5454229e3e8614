//! Binance spot klines (`GET /api/v3/klines`).

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{field, parse_number, ExchangeClient};
use crate::models::{Candle, Timeframe};
use crate::services::market_data::DataSourceError;

pub const DEFAULT_BINANCE_URL: &str = "https://api.binance.com";
/// Most klines the endpoint returns per request.
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    quote: String,
}

impl BinanceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DataSourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            quote: "USDT".to_string(),
        })
    }

    pub fn pair(&self, symbol: &str) -> String {
        format!("{}{}", symbol.trim().to_uppercase(), self.quote)
    }

    fn interval(timeframe: Timeframe) -> Option<&'static str> {
        match timeframe {
            Timeframe::M15 => Some("15m"),
            Timeframe::M30 => Some("30m"),
            Timeframe::H1 => Some("1h"),
            Timeframe::H2 => Some("2h"),
            Timeframe::H4 => Some("4h"),
            Timeframe::H6 => Some("6h"),
            Timeframe::H12 => Some("12h"),
            Timeframe::D1 => Some("1d"),
            Timeframe::H3 => None,
        }
    }

    async fn fetch_page(
        &self,
        pair: &str,
        interval: &str,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>, DataSourceError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let mut query = vec![
            ("symbol", pair.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end_time) = end_time {
            query.push(("endTime", end_time.to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DataSourceError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let rows: Vec<Vec<Value>> = serde_json::from_str(&text)
            .map_err(|e| DataSourceError::Decode(format!("binance klines: {}", e)))?;
        rows.iter().map(|row| parse_row(row)).collect()
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    fn supports(&self, timeframe: Timeframe) -> bool {
        Self::interval(timeframe).is_some()
    }

    /// Requests above [`MAX_LIMIT`] are paged backwards with `endTime`
    /// until `limit` candles are collected or history runs out.
    async fn fetch_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataSourceError> {
        let interval =
            Self::interval(timeframe).ok_or(DataSourceError::UnsupportedTimeframe(timeframe))?;
        let pair = self.pair(symbol);
        let wanted = limit.max(1);

        let mut candles: Vec<Candle> = Vec::with_capacity(wanted);
        let mut end_time: Option<i64> = None;
        let mut pages = 0usize;
        while candles.len() < wanted {
            let page_size = (wanted - candles.len()).min(MAX_LIMIT);
            let mut page = self.fetch_page(&pair, interval, page_size, end_time).await?;
            pages += 1;
            let Some(first) = page.first() else {
                break;
            };
            end_time = Some(first.timestamp.timestamp_millis() - 1);
            let exhausted = page.len() < page_size;
            page.append(&mut candles);
            candles = page;
            if exhausted {
                break;
            }
        }

        if pages > 1 {
            debug!(
                pair = %pair,
                pages,
                count = candles.len(),
                "BinanceClient: paged {} klines for {}",
                candles.len(),
                pair
            );
        }
        Ok(candles)
    }
}

/// `[open_time_ms, open, high, low, close, volume, close_time_ms, ...]`
fn parse_row(row: &[Value]) -> Result<Candle, DataSourceError> {
    let open_time = field(row, 0, "open time")?
        .as_i64()
        .ok_or_else(|| DataSourceError::Decode("binance open time is not an integer".into()))?;
    let timestamp = DateTime::from_timestamp_millis(open_time)
        .ok_or_else(|| DataSourceError::Decode(format!("open time out of range: {}", open_time)))?;

    Ok(Candle::new(
        parse_number(field(row, 1, "open")?, "open")?,
        parse_number(field(row, 2, "high")?, "high")?,
        parse_number(field(row, 3, "low")?, "low")?,
        parse_number(field(row, 4, "close")?, "close")?,
        parse_number(field(row, 5, "volume")?, "volume")?,
        timestamp,
    ))
}
