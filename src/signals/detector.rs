//! WaveTrend crossover detection.
//!
//! buy  = cross && wt2 - wt1 <= 0 && wt1 <= oversold && wt2 <= oversold
//! sell = cross && wt2 - wt1 >= 0 && wt1 >= overbought && wt2 >= overbought
//!
//! where `cross` holds when wt1 was at or below wt2 on the previous bar and
//! strictly above it now, or at or above it and strictly below it now.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::indicators::momentum::WaveTrend;
use crate::indicators::IndicatorError;
use crate::models::SignalKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneThresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            oversold: -60.0,
            overbought: 60.0,
        }
    }
}

/// A crossover that satisfied direction and zone at `index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub kind: SignalKind,
    pub index: usize,
    pub wt1: f64,
    pub wt2: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SignalDetector {
    zones: ZoneThresholds,
}

impl SignalDetector {
    pub fn new(zones: ZoneThresholds) -> Self {
        Self { zones }
    }

    /// Evaluate the last index of the series.
    pub fn detect(&self, wave: &WaveTrend) -> Result<Option<Detection>, IndicatorError> {
        match wave.len().checked_sub(1) {
            Some(last) => self.detect_at(wave, last),
            None => Ok(None),
        }
    }

    /// Evaluate a single index. Undefined values on either bar never signal.
    pub fn detect_at(
        &self,
        wave: &WaveTrend,
        index: usize,
    ) -> Result<Option<Detection>, IndicatorError> {
        if index == 0 {
            return Ok(None);
        }
        let (Some((prev1, prev2)), Some((wt1, wt2))) =
            (wave.value_at(index - 1), wave.value_at(index))
        else {
            return Ok(None);
        };

        let crossed = crossed(prev1, prev2, wt1, wt2);
        let buy = crossed
            && wt2 - wt1 <= 0.0
            && wt1 <= self.zones.oversold
            && wt2 <= self.zones.oversold;
        let sell = crossed
            && wt2 - wt1 >= 0.0
            && wt1 >= self.zones.overbought
            && wt2 >= self.zones.overbought;

        let kind = match (buy, sell) {
            (true, true) => {
                error!(index, wt1, wt2, "SignalDetector: BUY and SELL fired on the same bar");
                return Err(IndicatorError::ConflictingSignals { index });
            }
            (true, false) => SignalKind::Buy,
            (false, true) => SignalKind::Sell,
            (false, false) => return Ok(None),
        };

        Ok(Some(Detection {
            kind,
            index,
            wt1,
            wt2,
        }))
    }
}

/// Line cross in either direction between two consecutive bars.
pub fn crossed(prev1: f64, prev2: f64, wt1: f64, wt2: f64) -> bool {
    (prev1 <= prev2 && wt1 > wt2) || (prev1 >= prev2 && wt1 < wt2)
}
