//! Secondary confirmation with the stochastic RSI.

use serde::{Deserialize, Serialize};

use crate::indicators::momentum::{calculate_stoch_rsi, StochRsiParams};
use crate::models::{ConfirmationStatus, SignalKind};

/// Which stochastic RSI line is compared against the thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationLine {
    K,
    #[default]
    D,
}

/// What to do when the confirmation oscillator cannot be computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnavailablePolicy {
    /// Drop the signal.
    #[default]
    Reject,
    /// Send the primary signal alone, flagged `Unavailable`.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    pub params: StochRsiParams,
    pub line: ConfirmationLine,
    pub oversold: f64,
    pub overbought: f64,
    pub on_unavailable: UnavailablePolicy,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self {
            params: StochRsiParams::default(),
            line: ConfirmationLine::D,
            oversold: 20.0,
            overbought: 80.0,
            on_unavailable: UnavailablePolicy::Reject,
        }
    }
}

impl ConfirmationGate {
    /// Evaluate the latest confirmation value for `kind` over `closes`.
    ///
    /// Too little history or an undefined latest value yields `Unavailable`.
    pub fn evaluate(&self, kind: SignalKind, closes: &[f64]) -> ConfirmationStatus {
        let series = match calculate_stoch_rsi(closes, &self.params) {
            Ok(series) => series,
            Err(e) => {
                return ConfirmationStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
        };
        let latest = match self.line {
            ConfirmationLine::K => series.latest_k(),
            ConfirmationLine::D => series.latest_d(),
        };
        match latest {
            Some(value) if self.confirms(kind, value) => ConfirmationStatus::Confirmed { value },
            Some(value) => ConfirmationStatus::Unconfirmed { value },
            None => ConfirmationStatus::Unavailable {
                reason: "latest stochastic RSI value undefined".to_string(),
            },
        }
    }

    /// BUY needs value <= oversold, SELL needs value >= overbought.
    pub fn confirms(&self, kind: SignalKind, value: f64) -> bool {
        match kind {
            SignalKind::Buy => value <= self.oversold,
            SignalKind::Sell => value >= self.overbought,
        }
    }

    /// Whether an alert may go out with this status.
    pub fn admits(&self, status: &ConfirmationStatus) -> bool {
        match status {
            ConfirmationStatus::Disabled | ConfirmationStatus::Confirmed { .. } => true,
            ConfirmationStatus::Unconfirmed { .. } => false,
            ConfirmationStatus::Unavailable { .. } => {
                self.on_unavailable == UnavailablePolicy::Fallback
            }
        }
    }
}
