//! Momentum oscillators: WaveTrend (primary), RSI and stochastic RSI (confirmation)

pub mod rsi;
pub mod stoch_rsi;
pub mod wavetrend;

pub use rsi::*;
pub use stoch_rsi::*;
pub use wavetrend::*;
