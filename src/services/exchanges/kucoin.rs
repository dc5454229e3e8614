//! KuCoin spot candles (`GET /api/v1/market/candles`).

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{field, parse_number, ExchangeClient};
use crate::models::{Candle, Timeframe};
use crate::services::market_data::DataSourceError;

pub const DEFAULT_KUCOIN_URL: &str = "https://api.kucoin.com";
const SUCCESS_CODE: &str = "200000";

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

#[derive(Debug, Clone)]
pub struct KucoinClient {
    client: reqwest::Client,
    base_url: String,
    quote: String,
}

impl KucoinClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DataSourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            quote: "USDT".to_string(),
        })
    }

    pub fn pair(&self, symbol: &str) -> String {
        format!("{}-{}", symbol.trim().to_uppercase(), self.quote)
    }

    fn interval(timeframe: Timeframe) -> Option<&'static str> {
        match timeframe {
            Timeframe::M15 => Some("15min"),
            Timeframe::M30 => Some("30min"),
            Timeframe::H1 => Some("1hour"),
            Timeframe::H2 => Some("2hour"),
            Timeframe::H4 => Some("4hour"),
            Timeframe::H6 => Some("6hour"),
            Timeframe::H12 => Some("12hour"),
            Timeframe::D1 => Some("1day"),
            Timeframe::H3 => None,
        }
    }
}

#[async_trait]
impl ExchangeClient for KucoinClient {
    fn name(&self) -> &str {
        "kucoin"
    }

    fn supports(&self, timeframe: Timeframe) -> bool {
        Self::interval(timeframe).is_some()
    }

    async fn fetch_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataSourceError> {
        let interval =
            Self::interval(timeframe).ok_or(DataSourceError::UnsupportedTimeframe(timeframe))?;
        let url = format!("{}/api/v1/market/candles", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("type", interval), ("symbol", self.pair(symbol).as_str())])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DataSourceError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: CandlesResponse = serde_json::from_str(&text)
            .map_err(|e| DataSourceError::Decode(format!("kucoin candles: {}", e)))?;
        if body.code != SUCCESS_CODE {
            return Err(DataSourceError::Api {
                status: status.as_u16(),
                body: format!("code {}: {}", body.code, body.msg.unwrap_or_default()),
            });
        }

        // Newest first on the wire.
        let mut candles = body
            .data
            .iter()
            .map(|row| parse_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        candles.sort_by_key(|c| c.timestamp);
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }
}

/// `[start_time_s, open, close, high, low, volume, turnover]`
fn parse_row(row: &[Value]) -> Result<Candle, DataSourceError> {
    let start = parse_number(field(row, 0, "start time")?, "start time")? as i64;
    let timestamp = DateTime::from_timestamp(start, 0)
        .ok_or_else(|| DataSourceError::Decode(format!("start time out of range: {}", start)))?;

    Ok(Candle::new(
        parse_number(field(row, 1, "open")?, "open")?,
        parse_number(field(row, 3, "high")?, "high")?,
        parse_number(field(row, 4, "low")?, "low")?,
        parse_number(field(row, 2, "close")?, "close")?,
        parse_number(field(row, 5, "volume")?, "volume")?,
        timestamp,
    ))
}
