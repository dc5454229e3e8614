use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::candle::Timeframe;
use super::coin::CoinInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
}

impl SignalKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SignalKind::Buy => "BUY",
            SignalKind::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A qualifying crossover on the latest candle of one symbol. Lives for a single scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalCandidate {
    pub symbol: String,
    pub kind: SignalKind,
    pub wt1: f64,
    pub wt2: f64,
    pub candle_timestamp: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub source_exchange: String,
}

/// Outcome of the secondary (stochastic RSI) check attached to an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// No confirmation oscillator configured.
    Disabled,
    Confirmed { value: f64 },
    Unconfirmed { value: f64 },
    /// Oscillator could not be computed; the alert went out on the primary signal alone.
    Unavailable { reason: String },
}

impl ConfirmationStatus {
    pub fn value(&self) -> Option<f64> {
        match self {
            ConfirmationStatus::Confirmed { value } | ConfirmationStatus::Unconfirmed { value } => {
                Some(*value)
            }
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfirmationStatus::Disabled => "disabled",
            ConfirmationStatus::Confirmed { .. } => "confirmed",
            ConfirmationStatus::Unconfirmed { .. } => "unconfirmed",
            ConfirmationStatus::Unavailable { .. } => "unavailable",
        }
    }
}

/// Everything a notifier needs to publish one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub candidate: SignalCandidate,
    pub coin: CoinInfo,
    pub confirmation: ConfirmationStatus,
    pub detected_at: DateTime<Utc>,
}
