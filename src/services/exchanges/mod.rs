//! REST candle sources with ordered fallback across exchanges.

pub mod binance;
pub mod kucoin;
pub mod resample;

pub use binance::BinanceClient;
pub use kucoin::KucoinClient;
pub use resample::resample;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{Candle, Timeframe};
use crate::services::market_data::{CandleBatch, CandleSource, DataSourceError};

/// A single exchange's public kline endpoint.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the exchange serves `timeframe` natively.
    fn supports(&self, timeframe: Timeframe) -> bool;

    /// Up to `limit` most recent candles at a natively supported timeframe, oldest first.
    async fn fetch_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataSourceError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Tries each exchange in order. The first one that returns candles wins.
pub struct ExchangeCandleSource {
    clients: Vec<Arc<dyn ExchangeClient>>,
    retry: RetryPolicy,
}

impl ExchangeCandleSource {
    pub fn new(clients: Vec<Arc<dyn ExchangeClient>>, retry: RetryPolicy) -> Self {
        Self { clients, retry }
    }

    pub fn exchanges(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.name()).collect()
    }

    async fn fetch_from(
        &self,
        client: &dyn ExchangeClient,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataSourceError> {
        let (native, factor) = native_timeframe(client, timeframe)
            .ok_or(DataSourceError::UnsupportedTimeframe(timeframe))?;
        // One extra bucket of base candles so a partial leading bucket can be dropped.
        let request = if factor == 1 {
            limit
        } else {
            (limit + 1) * factor
        };

        let candles = (|| client.fetch_klines(symbol, native, request))
            .retry(self.retry.backoff())
            .when(DataSourceError::is_transient)
            .notify(|err, delay| {
                warn!(
                    exchange = client.name(),
                    symbol = %symbol,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "ExchangeCandleSource: retrying {} after transient error",
                    client.name()
                );
            })
            .await?;

        if factor == 1 {
            return Ok(candles);
        }

        let mut aggregated = resample(&candles, timeframe, native);
        if aggregated.len() > limit {
            aggregated.drain(..aggregated.len() - limit);
        }
        debug!(
            exchange = client.name(),
            symbol = %symbol,
            base = %native,
            target = %timeframe,
            count = aggregated.len(),
            "ExchangeCandleSource: resampled {} {} candles into {}",
            candles.len(),
            native,
            timeframe
        );
        Ok(aggregated)
    }
}

#[async_trait]
impl CandleSource for ExchangeCandleSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<CandleBatch, DataSourceError> {
        let mut failures = Vec::new();
        let mut empty_from = None;

        for client in &self.clients {
            match self.fetch_from(client.as_ref(), symbol, timeframe, limit).await {
                Ok(candles) if !candles.is_empty() => {
                    debug!(
                        exchange = client.name(),
                        symbol = %symbol,
                        count = candles.len(),
                        "ExchangeCandleSource: fetched {} candles for {} from {}",
                        candles.len(),
                        symbol,
                        client.name()
                    );
                    return Ok(CandleBatch::new(candles, client.name()));
                }
                Ok(_) => {
                    debug!(
                        exchange = client.name(),
                        symbol = %symbol,
                        "ExchangeCandleSource: {} returned no candles for {}",
                        client.name(),
                        symbol
                    );
                    empty_from.get_or_insert_with(|| client.name().to_string());
                }
                Err(e) => {
                    warn!(
                        exchange = client.name(),
                        symbol = %symbol,
                        error = %e,
                        "ExchangeCandleSource: {} failed for {}",
                        client.name(),
                        symbol
                    );
                    failures.push(format!("{}: {}", client.name(), e));
                }
            }
        }

        if let Some(exchange) = empty_from {
            return Ok(CandleBatch::new(Vec::new(), exchange));
        }

        Err(DataSourceError::Unavailable {
            symbol: symbol.to_string(),
            reason: if failures.is_empty() {
                "no exchanges configured".to_string()
            } else {
                failures.join("; ")
            },
        })
    }
}

/// The timeframe to request from `client` and how many of its candles make
/// one `target` candle. Prefers the native interval, else the largest
/// supported divisor.
pub fn native_timeframe(
    client: &dyn ExchangeClient,
    target: Timeframe,
) -> Option<(Timeframe, usize)> {
    if client.supports(target) {
        return Some((target, 1));
    }
    Timeframe::ALL
        .iter()
        .rev()
        .copied()
        .filter(|tf| tf.seconds() < target.seconds() && target.seconds() % tf.seconds() == 0)
        .find(|tf| client.supports(*tf))
        .map(|tf| (tf, (target.seconds() / tf.seconds()) as usize))
}

/// Exchanges return prices as JSON strings or numbers depending on the endpoint.
pub(crate) fn parse_number(value: &Value, field: &str) -> Result<f64, DataSourceError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| DataSourceError::Decode(format!("invalid {}: {}", field, value)))
}

pub(crate) fn field<'a>(row: &'a [Value], index: usize, name: &str) -> Result<&'a Value, DataSourceError> {
    row.get(index)
        .ok_or_else(|| DataSourceError::Decode(format!("kline row missing {}", name)))
}
