//! Stochastic RSI
//!
//! StochRSI = 100 * (RSI - min(RSI, n)) / (max(RSI, n) - min(RSI, n))
//! %K = SMA(StochRSI, k_smooth)
//! %D = SMA(%K, d_smooth)

use serde::{Deserialize, Serialize};

use super::rsi::calculate_rsi;
use crate::common::math;
use crate::indicators::error::IndicatorError;

/// Value used when the RSI range over the stochastic window is zero.
pub const STOCH_MIDPOINT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochRsiParams {
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub k_smooth: usize,
    pub d_smooth: usize,
}

impl Default for StochRsiParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            stoch_period: 14,
            k_smooth: 3,
            d_smooth: 3,
        }
    }
}

impl StochRsiParams {
    /// Closes needed before %D has its first value.
    pub fn min_closes(&self) -> usize {
        self.rsi_period + self.stoch_period + self.k_smooth + self.d_smooth - 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StochRsi {
    pub rsi: Vec<f64>,
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

impl StochRsi {
    pub fn latest_k(&self) -> Option<f64> {
        self.k.last().copied().filter(|v| v.is_finite())
    }

    pub fn latest_d(&self) -> Option<f64> {
        self.d.last().copied().filter(|v| v.is_finite())
    }
}

pub fn calculate_stoch_rsi(
    closes: &[f64],
    params: &StochRsiParams,
) -> Result<StochRsi, IndicatorError> {
    IndicatorError::require(params.min_closes(), closes.len())?;

    let rsi = calculate_rsi(closes, params.rsi_period)?;
    let stoch: Vec<f64> = math::rolling_min_max(&rsi, params.stoch_period)
        .into_iter()
        .zip(&rsi)
        .map(|(range, &value)| match range {
            None => f64::NAN,
            Some((min, max)) if max - min == 0.0 => STOCH_MIDPOINT,
            Some((min, max)) => 100.0 * (value - min) / (max - min),
        })
        .collect();

    let k = math::sma_series(&stoch, params.k_smooth);
    let d = math::sma_series(&k, params.d_smooth);

    Ok(StochRsi { rsi, k, d })
}
