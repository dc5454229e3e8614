//! Unit tests for the WaveTrend crossover detector

use wavewatch::indicators::momentum::WaveTrend;
use wavewatch::models::SignalKind;
use wavewatch::signals::{crossed, SignalDetector, ZoneThresholds};

fn series(wt1: &[f64], wt2: &[f64]) -> WaveTrend {
    WaveTrend {
        wt1: wt1.to_vec(),
        wt2: wt2.to_vec(),
    }
}

#[test]
fn test_crossed_semantics() {
    assert!(crossed(-1.0, 0.0, 1.0, 0.0));
    assert!(crossed(1.0, 0.0, -1.0, 0.0));
    // touching on the previous bar counts for either side
    assert!(crossed(0.0, 0.0, 1.0, 0.0));
    assert!(crossed(0.0, 0.0, -1.0, 0.0));
    // ending equal is not a cross
    assert!(!crossed(-1.0, 0.0, 0.0, 0.0));
    assert!(!crossed(1.0, 0.0, 2.0, 0.0));
}

#[test]
fn test_buy_fires_only_at_crossover_index() {
    let wt1 = [f64::NAN, -80.0, -78.0, -73.0, -66.0, -64.0, -62.0];
    let wt2 = [f64::NAN, -70.0, -72.0, -74.0, -70.0, -67.0, -65.0];
    let wave = series(&wt1, &wt2);
    let detector = SignalDetector::default();

    for i in 0..wt1.len() {
        let detection = detector.detect_at(&wave, i).unwrap();
        if i == 3 {
            let detection = detection.expect("buy at 3");
            assert_eq!(detection.kind, SignalKind::Buy);
            assert_eq!(detection.index, 3);
            assert_eq!(detection.wt1, -73.0);
            assert_eq!(detection.wt2, -74.0);
        } else {
            assert!(detection.is_none(), "unexpected signal at {}", i);
        }
    }
}

#[test]
fn test_sell_requires_both_lines_overbought() {
    let detector = SignalDetector::default();
    let sell = series(&[70.0, 61.0], &[65.0, 62.0]);
    let detection = detector.detect(&sell).unwrap().unwrap();
    assert_eq!(detection.kind, SignalKind::Sell);

    let only_wt2_overbought = series(&[70.0, 59.0], &[65.0, 62.0]);
    assert!(detector.detect(&only_wt2_overbought).unwrap().is_none());
}

#[test]
fn test_cross_outside_zone_is_ignored() {
    let detector = SignalDetector::default();
    let neutral = series(&[-10.0, 5.0], &[0.0, 0.0]);
    assert!(detector.detect(&neutral).unwrap().is_none());

    // Upward cross in the overbought zone is neither BUY nor SELL.
    let wrong_direction = series(&[70.0, 75.0], &[72.0, 73.0]);
    assert!(detector.detect(&wrong_direction).unwrap().is_none());
}

#[test]
fn test_zone_boundary_is_inclusive() {
    let detector = SignalDetector::default();
    let wave = series(&[-61.0, -60.0], &[-60.5, -60.5]);
    assert_eq!(
        detector.detect(&wave).unwrap().map(|d| d.kind),
        Some(SignalKind::Buy)
    );
}

#[test]
fn test_undefined_values_never_signal() {
    let detector = SignalDetector::default();
    assert!(detector.detect(&series(&[], &[])).unwrap().is_none());
    assert!(detector
        .detect(&series(&[f64::NAN, -70.0], &[f64::NAN, -75.0]))
        .unwrap()
        .is_none());
}

#[test]
fn test_inverted_zones_still_pick_one_direction() {
    // Both zone tests pass; the direction test decides.
    let detector = SignalDetector::new(ZoneThresholds {
        oversold: 100.0,
        overbought: -100.0,
    });
    let wave = series(&[0.0, 0.0], &[0.0, 0.0]);
    assert!(detector.detect(&wave).unwrap().is_none());

    let crossing = series(&[0.0, 1.0], &[0.0, 0.0]);
    // Upward cross: wt2 - wt1 < 0 satisfies BUY and fails SELL's direction.
    assert_eq!(
        detector.detect(&crossing).unwrap().map(|d| d.kind),
        Some(SignalKind::Buy)
    );
}
