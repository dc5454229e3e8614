//! RSI (Relative Strength Index) indicator
//!
//! RSI = 100 - (100 / (1 + RS))
//! RS = Average Gain / Average Loss, both smoothed with Wilder's method

use crate::common::math;
use crate::indicators::error::IndicatorError;

/// Calculate the RSI series over closing prices.
///
/// Gains and losses start from zero at the first close and are smoothed
/// recursively with factor 1 / period. The first `period` positions are
/// NaN. A window with neither gains nor losses reads 50; one with gains but
/// no losses reads 100.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    IndicatorError::require(period + 1, closes.len())?;

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(0.0);
    losses.push(0.0);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gain = math::wilder_series(&gains, period);
    let avg_loss = math::wilder_series(&losses, period);

    let mut rsi: Vec<f64> = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&gain, &loss)| {
            if !gain.is_finite() || !loss.is_finite() {
                f64::NAN
            } else if gain == 0.0 && loss == 0.0 {
                50.0
            } else if loss == 0.0 {
                100.0
            } else {
                100.0 - (100.0 / (1.0 + gain / loss))
            }
        })
        .collect();
    math::mask_warmup(&mut rsi, period);

    Ok(rsi)
}

/// Latest RSI value with the default period (14)
pub fn latest_rsi(closes: &[f64]) -> Option<f64> {
    calculate_rsi(closes, 14)
        .ok()
        .and_then(|series| series.last().copied())
        .filter(|v| v.is_finite())
}
