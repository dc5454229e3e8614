//! External collaborators: candle sources, the coin universe and notifiers.

pub mod exchanges;
pub mod market_data;
pub mod notifier;
pub mod universe;

pub use market_data::{CandleBatch, CandleSource, DataSourceError};
pub use notifier::{Notifier, NotifyError};
pub use universe::{CoinUniverse, UniverseError, UniverseFilter};
