//! Redis store against a live server.
//!
//! Run with: REDIS_URL=redis://127.0.0.1:6379 cargo test --test integration redis_store -- --ignored

use chrono::{TimeZone, Utc};
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use wavewatch::cache::{DedupCache, KeyValueStore, RedisStore};
use wavewatch::models::{SignalKind, Timeframe};

/// Server URL and a prefix no other run shares, or `None` when REDIS_URL is unset.
fn redis_target(label: &str) -> Option<(String, String)> {
    let url = std::env::var("REDIS_URL").ok()?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let prefix = format!("wavewatch-test:{}:{}:{}:", label, std::process::id(), nanos);
    Some((url, prefix))
}

async fn clear(store: &RedisStore) {
    let keys: Vec<String> = store
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    store.delete_many(&keys).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn set_if_absent_and_prefixed_entries() {
    let Some((url, prefix)) = redis_target("kv") else {
        println!("REDIS_URL not set, skipping");
        return;
    };
    let store = RedisStore::connect(&url, prefix.clone(), Duration::from_secs(600))
        .await
        .unwrap();

    assert!(store.set_if_absent("BTC_BUY_20240101_0000", "first").await.unwrap());
    assert!(!store.set_if_absent("BTC_BUY_20240101_0000", "second").await.unwrap());
    assert!(store.set_if_absent("ETH_SELL_20240101_0000", "other").await.unwrap());
    assert_eq!(
        store.get("BTC_BUY_20240101_0000").await.unwrap().as_deref(),
        Some("first")
    );
    assert_eq!(store.get("SOL_BUY_20240101_0000").await.unwrap(), None);

    let mut entries = store.entries().await.unwrap();
    entries.sort();
    assert_eq!(
        entries,
        vec![
            ("BTC_BUY_20240101_0000".to_string(), "first".to_string()),
            ("ETH_SELL_20240101_0000".to_string(), "other".to_string()),
        ]
    );

    // Keys carry the prefix on the server and expire natively.
    let mut conn = redis::Client::open(url.as_str())
        .unwrap()
        .get_multiplexed_async_connection()
        .await
        .unwrap();
    let ttl: i64 = conn
        .ttl(format!("{}BTC_BUY_20240101_0000", prefix))
        .await
        .unwrap();
    assert!(ttl > 0 && ttl <= 600, "ttl = {}", ttl);

    assert!(store.delete("ETH_SELL_20240101_0000").await.unwrap());
    assert!(!store.delete("ETH_SELL_20240101_0000").await.unwrap());
    assert_eq!(
        store
            .delete_many(&["BTC_BUY_20240101_0000".to_string(), "MISSING".to_string()])
            .await
            .unwrap(),
        1
    );
    assert!(store.entries().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore]
async fn entries_ignore_other_prefixes() {
    let Some((url, prefix)) = redis_target("scope") else {
        println!("REDIS_URL not set, skipping");
        return;
    };
    let mine = RedisStore::connect(&url, format!("{}a:", prefix), Duration::from_secs(600))
        .await
        .unwrap();
    let theirs = RedisStore::connect(&url, format!("{}b:", prefix), Duration::from_secs(600))
        .await
        .unwrap();

    mine.set_if_absent("BTC_BUY_20240101_0000", "mine").await.unwrap();
    theirs.set_if_absent("BTC_BUY_20240101_0000", "theirs").await.unwrap();

    assert_eq!(
        mine.entries().await.unwrap(),
        vec![("BTC_BUY_20240101_0000".to_string(), "mine".to_string())]
    );
    clear(&mine).await;
    clear(&theirs).await;
}

#[tokio::test]
#[ignore]
async fn dedup_claims_bucket_once() {
    let Some((url, prefix)) = redis_target("dedup") else {
        println!("REDIS_URL not set, skipping");
        return;
    };
    let store = Arc::new(
        RedisStore::connect(&url, prefix, Duration::from_secs(600))
            .await
            .unwrap(),
    );
    let dedup = DedupCache::new(store.clone(), Timeframe::H2);
    let candle = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let now = candle + chrono::Duration::minutes(4);

    assert!(dedup.is_allowed("BTC", SignalKind::Buy, candle, now).await);
    assert!(!dedup.is_allowed("BTC", SignalKind::Buy, candle, now).await);
    assert_eq!(
        dedup.first_seen("BTC", SignalKind::Buy, candle).await.unwrap(),
        Some(now)
    );
    clear(&store).await;
}
