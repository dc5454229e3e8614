//! Unit tests for the alert deduplication cache

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use wavewatch::cache::dedup::parse_seen_at;
use wavewatch::cache::{DedupCache, KeyValueStore, MemoryStore, StoreError};
use wavewatch::models::{SignalKind, Timeframe};

struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }

    async fn set_if_absent(&self, _key: &str, _value: &str) -> Result<bool, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }

    async fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }
}

fn cache(timeframe: Timeframe) -> (DedupCache, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (DedupCache::new(store.clone(), timeframe), store)
}

#[test]
fn test_bucket_key_format() {
    let (dedup, _) = cache(Timeframe::H2);
    let ts = Utc.with_ymd_and_hms(2024, 6, 1, 13, 45, 0).unwrap();
    assert_eq!(dedup.bucket_key("btc", SignalKind::Buy, ts), "BTC_BUY_20240601_1200");
    assert_eq!(dedup.bucket_key("ETH", SignalKind::Sell, ts), "ETH_SELL_20240601_1200");
}

#[test]
fn test_bucket_key_is_deterministic_within_bucket() {
    let (dedup, _) = cache(Timeframe::H4);
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let key = dedup.bucket_key("SOL", SignalKind::Buy, start);
    for minutes in [1, 59, 120, 239] {
        assert_eq!(
            dedup.bucket_key("SOL", SignalKind::Buy, start + Duration::minutes(minutes)),
            key
        );
    }
    assert_ne!(
        dedup.bucket_key("SOL", SignalKind::Buy, start + Duration::minutes(240)),
        key
    );
}

#[tokio::test]
async fn test_is_allowed_once_per_bucket() {
    let (dedup, _) = cache(Timeframe::H1);
    let candle = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
    let now = candle + Duration::minutes(3);

    assert!(dedup.is_allowed("BTC", SignalKind::Buy, candle, now).await);
    assert!(!dedup.is_allowed("BTC", SignalKind::Buy, candle, now).await);
    assert!(
        !dedup
            .is_allowed("BTC", SignalKind::Buy, candle + Duration::minutes(30), now)
            .await
    );

    // Other kind, other symbol and next bucket are independent.
    assert!(dedup.is_allowed("BTC", SignalKind::Sell, candle, now).await);
    assert!(dedup.is_allowed("ETH", SignalKind::Buy, candle, now).await);
    assert!(
        dedup
            .is_allowed("BTC", SignalKind::Buy, candle + Duration::hours(1), now)
            .await
    );
}

#[tokio::test]
async fn test_first_seen_recorded() {
    let (dedup, _) = cache(Timeframe::H1);
    let candle = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
    let now = candle + Duration::minutes(2);

    assert_eq!(dedup.first_seen("BTC", SignalKind::Buy, candle).await.unwrap(), None);
    dedup.is_allowed("BTC", SignalKind::Buy, candle, now).await;
    assert_eq!(
        dedup.first_seen("BTC", SignalKind::Buy, candle).await.unwrap(),
        Some(now)
    );
}

#[tokio::test]
async fn test_store_failure_denies_alert() {
    let dedup = DedupCache::new(Arc::new(BrokenStore), Timeframe::H1);
    let candle = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
    assert!(!dedup.is_allowed("BTC", SignalKind::Buy, candle, candle).await);
    assert!(dedup.cleanup_expired(Duration::days(7), candle).await.is_err());
}

#[tokio::test]
async fn test_cleanup_expired() {
    let (dedup, store) = cache(Timeframe::H1);
    let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();

    store
        .set_if_absent("OLD_BUY_20240601_1000", &(now - Duration::days(8)).to_rfc3339())
        .await
        .unwrap();
    store
        .set_if_absent("EDGE_BUY_20240603_0000", &(now - Duration::days(7)).to_rfc3339())
        .await
        .unwrap();
    store
        .set_if_absent("NEW_SELL_20240609_2300", &(now - Duration::hours(1)).to_rfc3339())
        .await
        .unwrap();
    store
        .set_if_absent("LEGACY_BUY_20240601_0000", "1717200000.5")
        .await
        .unwrap();
    store.set_if_absent("JUNK", "not a timestamp").await.unwrap();

    let removed = dedup.cleanup_expired(Duration::days(7), now).await.unwrap();
    assert_eq!(removed, 3);

    let mut keys: Vec<String> = store.entries().await.unwrap().into_iter().map(|(k, _)| k).collect();
    keys.sort();
    assert_eq!(keys, vec!["EDGE_BUY_20240603_0000", "NEW_SELL_20240609_2300"]);

    // Idempotent
    assert_eq!(dedup.cleanup_expired(Duration::days(7), now).await.unwrap(), 0);
}

#[test]
fn test_parse_seen_at_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(parse_seen_at("2024-06-01T00:00:00+00:00"), Some(expected));
    assert_eq!(parse_seen_at("2024-06-01T02:00:00+02:00"), Some(expected));
    assert_eq!(parse_seen_at("2024-06-01T00:00:00.000000"), Some(expected));
    assert_eq!(parse_seen_at("1717200000"), Some(expected));
    assert_eq!(parse_seen_at("soon"), None);
}
