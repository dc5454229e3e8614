//! Unit tests for candle resampling

use chrono::Duration;
use wavewatch::models::Timeframe;
use wavewatch::services::exchanges::resample::resample;

use crate::fixtures::{base_time, candles_from_closes};

#[test]
fn test_hourly_to_three_hour() {
    let closes: Vec<f64> = (0..9).map(|i| 100.0 + i as f64).collect();
    let hourly = candles_from_closes(&closes, base_time(), Duration::hours(1));

    let out = resample(&hourly, Timeframe::H3, Timeframe::H1);
    assert_eq!(out.len(), 3);

    let first = out[0];
    assert_eq!(first.timestamp, base_time());
    assert_eq!(first.open, hourly[0].open);
    assert_eq!(first.close, hourly[2].close);
    assert_eq!(first.high, hourly[2].high);
    assert_eq!(first.low, hourly[0].low);
    assert_eq!(first.volume, 3_000.0);
    assert_eq!(out[2].timestamp, base_time() + Duration::hours(6));
}

#[test]
fn test_partial_leading_bucket_dropped() {
    let closes: Vec<f64> = (0..8).map(|i| 100.0 + i as f64).collect();
    // Starts at 01:00, so the 00:00 bucket only has two of its three hours.
    let hourly = candles_from_closes(&closes, base_time() + Duration::hours(1), Duration::hours(1));

    let out = resample(&hourly, Timeframe::H3, Timeframe::H1);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].timestamp, base_time() + Duration::hours(3));
    assert_eq!(out[0].open, hourly[2].open);
}

#[test]
fn test_forming_trailing_bucket_kept() {
    let closes: Vec<f64> = (0..4).map(|i| 100.0 + i as f64).collect();
    let hourly = candles_from_closes(&closes, base_time(), Duration::hours(1));

    let out = resample(&hourly, Timeframe::H3, Timeframe::H1);
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].timestamp, base_time() + Duration::hours(3));
    assert_eq!(out[1].close, 103.0);
    assert_eq!(out[1].volume, 1_000.0);
}

#[test]
fn test_empty_input() {
    assert!(resample(&[], Timeframe::H3, Timeframe::H1).is_empty());
}
