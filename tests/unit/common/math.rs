//! Unit tests for moving-average primitives

use wavewatch::common::math::{
    ema_alpha, ema_series, mask_warmup, rolling_min_max, sma_series, wilder_series,
};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_ema_alpha() {
    assert!(approx(ema_alpha(9), 0.2));
    assert!(approx(ema_alpha(1), 1.0));
}

#[test]
fn test_ema_seeds_with_first_value() {
    let ema = ema_series(&[10.0, 20.0, 30.0], 3);
    assert!(approx(ema[0], 10.0));
    assert!(approx(ema[1], 15.0));
    assert!(approx(ema[2], 22.5));
}

#[test]
fn test_ema_skips_leading_nan_and_holds_on_gap() {
    let ema = ema_series(&[f64::NAN, 4.0, f64::NAN, 8.0], 3);
    assert!(ema[0].is_nan());
    assert!(approx(ema[1], 4.0));
    assert!(approx(ema[2], 4.0));
    assert!(approx(ema[3], 6.0));
}

#[test]
fn test_wilder_uses_one_over_period() {
    let smoothed = wilder_series(&[0.0, 4.0], 4);
    assert!(approx(smoothed[1], 1.0));
}

#[test]
fn test_sma_warmup_and_values() {
    let sma = sma_series(&[1.0, 2.0, 3.0, 4.0], 3);
    assert!(sma[0].is_nan());
    assert!(sma[1].is_nan());
    assert!(approx(sma[2], 2.0));
    assert!(approx(sma[3], 3.0));
}

#[test]
fn test_sma_window_with_nan_is_nan() {
    let sma = sma_series(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
    assert!(sma[1].is_nan());
    assert!(sma[2].is_nan());
    assert!(approx(sma[3], 3.5));
}

#[test]
fn test_rolling_min_max() {
    let ranges = rolling_min_max(&[3.0, 1.0, 2.0, 5.0], 3);
    assert_eq!(ranges[0], None);
    assert_eq!(ranges[1], None);
    assert_eq!(ranges[2], Some((1.0, 3.0)));
    assert_eq!(ranges[3], Some((1.0, 5.0)));
}

#[test]
fn test_mask_warmup_clamps_to_len() {
    let mut values = vec![1.0, 2.0];
    mask_warmup(&mut values, 5);
    assert!(values.iter().all(|v| v.is_nan()));
}
