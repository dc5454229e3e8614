//! Shared data models spanning the engine layers.

pub mod candle;
pub mod coin;
pub mod scan;
pub mod signal;

pub use candle::{floor_to_bucket, Candle, HeikinAshiCandle, Timeframe};
pub use coin::CoinInfo;
pub use scan::ScanResult;
pub use signal::{Alert, ConfirmationStatus, SignalCandidate, SignalKind};
