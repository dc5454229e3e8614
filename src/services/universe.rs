//! Coin universe snapshot loading and quality filtering.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::CoinInfo;

const STABLE_PATTERNS: [&str; 7] = ["USD", "USDT", "USDC", "BUSD", "TUSD", "FDUSD", "DAI"];
const WRAPPED_TOKENS: [&str; 3] = ["WBTC", "WETH", "WBNB"];
const MAX_SANE_PRICE: f64 = 1_000_000.0;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to read coin universe {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse coin universe {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinUniverse {
    #[serde(default)]
    pub coins: Vec<CoinInfo>,
}

impl CoinUniverse {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, UniverseError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| UniverseError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let universe: CoinUniverse =
            serde_json::from_str(&raw).map_err(|source| UniverseError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), count = universe.coins.len(), "CoinUniverse: loaded snapshot");
        Ok(universe)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

/// Counts of why coins were dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub blocked: usize,
    pub invalid: usize,
    pub below_market_cap: usize,
    pub below_volume: usize,
    pub duplicates: usize,
    pub qualified: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseFilter {
    pub blocklist: Vec<String>,
    pub min_market_cap: f64,
    pub min_volume: f64,
}

impl UniverseFilter {
    /// Blocklisted, stablecoin-like or wrapped token.
    pub fn is_blocked(&self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        self.blocklist
            .iter()
            .any(|blocked| blocked.trim().eq_ignore_ascii_case(&symbol))
            || STABLE_PATTERNS.iter().any(|p| symbol.contains(p))
            || WRAPPED_TOKENS.contains(&symbol.as_str())
    }

    pub fn apply(&self, coins: &[CoinInfo]) -> (Vec<CoinInfo>, FilterStats) {
        let mut stats = FilterStats {
            total: coins.len(),
            ..FilterStats::default()
        };
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for coin in coins {
            let ticker = coin.ticker();
            if ticker.is_empty() || !has_sane_quotes(coin) {
                stats.invalid += 1;
                continue;
            }
            if self.is_blocked(&ticker) {
                stats.blocked += 1;
                continue;
            }
            if coin.market_cap < self.min_market_cap {
                stats.below_market_cap += 1;
                continue;
            }
            if coin.total_volume < self.min_volume {
                stats.below_volume += 1;
                continue;
            }
            if !seen.insert(ticker) {
                stats.duplicates += 1;
                continue;
            }
            kept.push(coin.clone());
        }

        stats.qualified = kept.len();
        info!(
            total = stats.total,
            qualified = stats.qualified,
            blocked = stats.blocked,
            invalid = stats.invalid,
            below_market_cap = stats.below_market_cap,
            below_volume = stats.below_volume,
            "UniverseFilter: {} of {} coins qualified",
            stats.qualified,
            stats.total
        );
        (kept, stats)
    }
}

fn has_sane_quotes(coin: &CoinInfo) -> bool {
    coin.current_price.is_finite()
        && coin.current_price > 0.0
        && coin.current_price <= MAX_SANE_PRICE
        && coin.total_volume.is_finite()
        && coin.total_volume > 0.0
        && coin.market_cap.is_finite()
        && coin.market_cap > 0.0
}
