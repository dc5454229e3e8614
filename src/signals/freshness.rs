//! Freshness gate: only alert on the candle of the bucket we are currently in,
//! and only early in that bucket.

use chrono::{DateTime, Duration, Utc};

use crate::models::{floor_to_bucket, Timeframe};

/// True when `candle_timestamp` falls in the same epoch-aligned bucket as
/// `now` and no more than `freshness_window` has elapsed since that bucket
/// opened (boundary inclusive).
pub fn is_fresh(
    candle_timestamp: DateTime<Utc>,
    bucket_secs: i64,
    now: DateTime<Utc>,
    freshness_window: Duration,
) -> bool {
    let current_bucket = floor_to_bucket(now, bucket_secs);
    let candle_bucket = floor_to_bucket(candle_timestamp, bucket_secs);
    candle_bucket == current_bucket && now - current_bucket <= freshness_window
}

#[derive(Debug, Clone, Copy)]
pub struct FreshnessGate {
    timeframe: Timeframe,
    window: Duration,
}

impl FreshnessGate {
    pub fn new(timeframe: Timeframe, window: Duration) -> Self {
        Self { timeframe, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, candle_timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        is_fresh(candle_timestamp, self.timeframe.seconds(), now, self.window)
    }

    /// Time elapsed since the bucket containing `now` opened.
    pub fn bucket_age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timeframe.bucket_start(now)
    }
}
