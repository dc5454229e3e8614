//! Upstream sanity checks on raw candles.

use crate::indicators::error::IndicatorError;
use crate::models::Candle;

/// Rejects batches containing non-finite prices, OHLC invariant violations
/// (high >= max(open, close), low <= min(open, close)) or timestamps that do
/// not strictly increase.
pub fn validate_candles(candles: &[Candle]) -> Result<(), IndicatorError> {
    for (index, candle) in candles.iter().enumerate() {
        let fields = [candle.open, candle.high, candle.low, candle.close];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(malformed(index, "non-finite price"));
        }
        if candle.high < candle.open.max(candle.close) {
            return Err(malformed(
                index,
                format!("high {} below body {}", candle.high, candle.open.max(candle.close)),
            ));
        }
        if candle.low > candle.open.min(candle.close) {
            return Err(malformed(
                index,
                format!("low {} above body {}", candle.low, candle.open.min(candle.close)),
            ));
        }
        if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
            return Err(malformed(index, "timestamps not strictly increasing"));
        }
    }
    Ok(())
}

fn malformed(index: usize, reason: impl Into<String>) -> IndicatorError {
    IndicatorError::MalformedCandle {
        index,
        reason: reason.into(),
    }
}
