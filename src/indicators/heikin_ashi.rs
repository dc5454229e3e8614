//! Heikin-Ashi candle transform
//!
//! HA Close = (Open + High + Low + Close) / 4
//! HA Open  = (previous HA Open + previous HA Close) / 2, seeded with (Open + Close) / 2
//! HA High  = max(HA Open, HA Close, High)
//! HA Low   = min(HA Open, HA Close, Low)

use crate::indicators::error::IndicatorError;
use crate::models::{Candle, HeikinAshiCandle};

/// Smallest batch the transform accepts regardless of downstream needs.
pub const MIN_HEIKIN_ASHI_CANDLES: usize = 2;

/// Convert raw candles to Heikin-Ashi candles.
///
/// `min_candles` is the warm-up the downstream oscillator needs; the call
/// fails with `InsufficientData` below it (and never below two candles).
pub fn heikin_ashi(
    candles: &[Candle],
    min_candles: usize,
) -> Result<Vec<HeikinAshiCandle>, IndicatorError> {
    IndicatorError::require(min_candles.max(MIN_HEIKIN_ASHI_CANDLES), candles.len())?;

    let mut out: Vec<HeikinAshiCandle> = Vec::with_capacity(candles.len());
    for candle in candles {
        let close = (candle.open + candle.high + candle.low + candle.close) / 4.0;
        let open = match out.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (candle.open + candle.close) / 2.0,
        };
        out.push(HeikinAshiCandle {
            open,
            high: open.max(close).max(candle.high),
            low: open.min(close).min(candle.low),
            close,
            volume: candle.volume,
            timestamp: candle.timestamp,
        });
    }

    Ok(out)
}
