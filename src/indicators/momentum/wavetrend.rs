//! WaveTrend oscillator
//!
//! ESA = EMA(hlc3, channel_len)
//! DE  = EMA(|hlc3 - ESA|, channel_len)
//! CI  = (hlc3 - ESA) / (0.015 * DE)
//! WT1 = EMA(CI, average_len)
//! WT2 = SMA(WT1, ma_len)

use serde::{Deserialize, Serialize};

use crate::common::math;
use crate::indicators::error::IndicatorError;
use crate::models::HeikinAshiCandle;

/// Denominator coefficient of the channel index. Signal timing depends on it.
pub const CI_COEFFICIENT: f64 = 0.015;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTrendParams {
    pub channel_len: usize,
    pub average_len: usize,
    pub ma_len: usize,
}

impl Default for WaveTrendParams {
    fn default() -> Self {
        Self {
            channel_len: 9,
            average_len: 12,
            ma_len: 3,
        }
    }
}

impl WaveTrendParams {
    /// Number of leading positions reported as undefined.
    pub fn warmup(&self) -> usize {
        self.channel_len + self.average_len + self.ma_len
    }

    /// Minimum input length that yields at least one warmed value.
    pub fn min_candles(&self) -> usize {
        self.warmup() + 1
    }
}

/// wt1/wt2 series aligned with the input candles. Undefined positions hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTrend {
    pub wt1: Vec<f64>,
    pub wt2: Vec<f64>,
}

impl WaveTrend {
    pub fn len(&self) -> usize {
        self.wt1.len().min(self.wt2.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Both lines at `index`, if defined there.
    pub fn value_at(&self, index: usize) -> Option<(f64, f64)> {
        let wt1 = *self.wt1.get(index)?;
        let wt2 = *self.wt2.get(index)?;
        (wt1.is_finite() && wt2.is_finite()).then_some((wt1, wt2))
    }

    pub fn latest(&self) -> Option<(f64, f64)> {
        self.len().checked_sub(1).and_then(|i| self.value_at(i))
    }
}

/// Compute WaveTrend over Heikin-Ashi candles.
///
/// A flat stretch where DE is zero yields NaN for CI (and for every
/// downstream value that depends only on it) instead of dividing by zero.
pub fn calculate_wavetrend(
    candles: &[HeikinAshiCandle],
    params: &WaveTrendParams,
) -> Result<WaveTrend, IndicatorError> {
    IndicatorError::require(params.min_candles(), candles.len())?;

    let typical: Vec<f64> = candles.iter().map(HeikinAshiCandle::hlc3).collect();
    let esa = math::ema_series(&typical, params.channel_len);
    let deviation: Vec<f64> = typical
        .iter()
        .zip(&esa)
        .map(|(price, avg)| (price - avg).abs())
        .collect();
    let de = math::ema_series(&deviation, params.channel_len);

    let ci: Vec<f64> = typical
        .iter()
        .zip(esa.iter().zip(&de))
        .map(|(price, (avg, dev))| {
            if *dev == 0.0 || !dev.is_finite() {
                f64::NAN
            } else {
                (price - avg) / (CI_COEFFICIENT * dev)
            }
        })
        .collect();

    let mut wt1 = math::ema_series(&ci, params.average_len);
    let mut wt2 = math::sma_series(&wt1, params.ma_len);
    math::mask_warmup(&mut wt1, params.warmup());
    math::mask_warmup(&mut wt2, params.warmup());

    Ok(WaveTrend { wt1, wt2 })
}
