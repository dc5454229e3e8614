//! Unit tests for coin universe loading and filtering

use tempfile::TempDir;
use wavewatch::models::CoinInfo;
use wavewatch::services::universe::FilterStats;
use wavewatch::services::{CoinUniverse, UniverseError, UniverseFilter};

fn coin(symbol: &str, price: f64, market_cap: f64, volume: f64) -> CoinInfo {
    CoinInfo {
        current_price: price,
        market_cap,
        total_volume: volume,
        ..CoinInfo::new(symbol)
    }
}

#[test]
fn test_blocks_stable_and_wrapped_tokens() {
    let filter = UniverseFilter {
        blocklist: vec!["pepe".to_string()],
        ..UniverseFilter::default()
    };
    assert!(filter.is_blocked("usdt"));
    assert!(filter.is_blocked("FDUSD"));
    assert!(filter.is_blocked("DAI"));
    assert!(filter.is_blocked("WBTC"));
    assert!(filter.is_blocked("PEPE"));
    assert!(!filter.is_blocked("BTC"));
    assert!(!filter.is_blocked("SOL"));
}

#[test]
fn test_apply_counts_each_reason() {
    let filter = UniverseFilter {
        blocklist: vec![],
        min_market_cap: 1_000_000.0,
        min_volume: 50_000.0,
    };
    let coins = vec![
        coin("btc", 60_000.0, 1.2e12, 3.0e10),
        coin("USDC", 1.0, 3.0e10, 5.0e9),
        coin("BAD", 0.0, 1.0e7, 1.0e6),
        coin("HUGE", 5.0e6, 1.0e9, 1.0e6),
        coin("TINY", 0.01, 5.0e5, 1.0e6),
        coin("THIN", 2.0, 5.0e6, 1.0e3),
        coin("BTC", 60_000.0, 1.2e12, 3.0e10),
        coin("ETH", 3_000.0, 3.6e11, 1.5e10),
    ];

    let (kept, stats) = filter.apply(&coins);
    let tickers: Vec<String> = kept.iter().map(CoinInfo::ticker).collect();
    assert_eq!(tickers, vec!["BTC", "ETH"]);
    assert_eq!(
        stats,
        FilterStats {
            total: 8,
            blocked: 1,
            invalid: 2,
            below_market_cap: 1,
            below_volume: 1,
            duplicates: 1,
            qualified: 2,
        }
    );
}

#[tokio::test]
async fn test_load_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("market_data.json");
    let body = r#"{"coins": [
        {"symbol": "btc", "name": "Bitcoin", "market_cap": 1.2e12, "total_volume": 3.0e10,
         "current_price": 60000.0, "price_change_percentage_24h": -1.5},
        {"symbol": "eth"}
    ]}"#;
    tokio::fs::write(&path, body).await.unwrap();

    let universe = CoinUniverse::load(&path).await.unwrap();
    assert_eq!(universe.len(), 2);
    assert_eq!(universe.coins[0].name.as_deref(), Some("Bitcoin"));
    assert_eq!(universe.coins[0].price_change_percentage_24h, Some(-1.5));
    assert_eq!(universe.coins[1].current_price, 0.0);
}

#[tokio::test]
async fn test_load_errors() {
    let dir = TempDir::new().unwrap();
    let missing = CoinUniverse::load(dir.path().join("nope.json")).await;
    assert!(matches!(missing, Err(UniverseError::Read { .. })));

    let path = dir.path().join("broken.json");
    tokio::fs::write(&path, "[1, 2").await.unwrap();
    let broken = CoinUniverse::load(&path).await;
    assert!(matches!(broken, Err(UniverseError::Parse { .. })));
}
