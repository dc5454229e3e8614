//! At-most-once alerting per (symbol, signal kind, candle bucket).

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::error::StoreError;
use crate::cache::store::KeyValueStore;
use crate::metrics::Metrics;
use crate::models::{SignalKind, Timeframe};

pub struct DedupCache {
    store: Arc<dyn KeyValueStore>,
    timeframe: Timeframe,
    metrics: Option<Arc<Metrics>>,
}

impl DedupCache {
    pub fn new(store: Arc<dyn KeyValueStore>, timeframe: Timeframe) -> Self {
        Self {
            store,
            timeframe,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// `SYMBOL_KIND_YYYYmmdd_HHMM`, where the time is the UTC start of the
    /// timeframe bucket holding `candle_timestamp`.
    pub fn bucket_key(
        &self,
        symbol: &str,
        kind: SignalKind,
        candle_timestamp: DateTime<Utc>,
    ) -> String {
        let bucket = self.timeframe.bucket_start(candle_timestamp);
        format!(
            "{}_{}_{}",
            symbol.trim().to_uppercase(),
            kind.as_str(),
            bucket.format("%Y%m%d_%H%M")
        )
    }

    /// Claim the bucket for this alert. Returns true exactly once per bucket.
    ///
    /// Store failures deny the alert.
    pub async fn is_allowed(
        &self,
        symbol: &str,
        kind: SignalKind,
        candle_timestamp: DateTime<Utc>,
        seen_at: DateTime<Utc>,
    ) -> bool {
        let key = self.bucket_key(symbol, kind, candle_timestamp);
        match self.store.set_if_absent(&key, &seen_at.to_rfc3339()).await {
            Ok(true) => {
                debug!(key = %key, "DedupCache: bucket claimed");
                true
            }
            Ok(false) => {
                let first_seen = self.first_seen_by_key(&key).await.ok().flatten();
                info!(
                    symbol = %symbol,
                    kind = %kind,
                    key = %key,
                    first_seen = ?first_seen,
                    "DedupCache: already alerted {} {} in this bucket",
                    symbol,
                    kind
                );
                false
            }
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    kind = %kind,
                    key = %key,
                    error = %e,
                    "DedupCache: store failure, denying alert"
                );
                if let Some(ref metrics) = self.metrics {
                    metrics.dedup_store_failures_total.inc();
                }
                false
            }
        }
    }

    /// When the bucket holding `candle_timestamp` was first alerted, if ever.
    pub async fn first_seen(
        &self,
        symbol: &str,
        kind: SignalKind,
        candle_timestamp: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let key = self.bucket_key(symbol, kind, candle_timestamp);
        self.first_seen_by_key(&key).await
    }

    async fn first_seen_by_key(&self, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .store
            .get(key)
            .await?
            .as_deref()
            .and_then(parse_seen_at))
    }

    /// Remove records first seen more than `retention` before `now`, plus
    /// records whose value cannot be parsed. Returns how many were removed.
    pub async fn cleanup_expired(
        &self,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let expired: Vec<String> = self
            .store
            .entries()
            .await?
            .into_iter()
            .filter(|(_, value)| match parse_seen_at(value) {
                Some(seen_at) => now - seen_at > retention,
                None => true,
            })
            .map(|(key, _)| key)
            .collect();

        if expired.is_empty() {
            return Ok(0);
        }

        let removed = self.store.delete_many(&expired).await?;
        info!(removed, "DedupCache: cleaned up {} expired entries", removed);
        Ok(removed)
    }
}

/// Accepts RFC 3339, naive ISO 8601 (read as UTC) and epoch seconds.
pub fn parse_seen_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    let secs = value.parse::<f64>().ok().filter(|s| s.is_finite())?;
    DateTime::from_timestamp_millis((secs * 1000.0) as i64)
}
