//! Unit tests for RSI and stochastic RSI

use wavewatch::indicators::momentum::{
    calculate_rsi, calculate_stoch_rsi, latest_rsi, StochRsiParams, STOCH_MIDPOINT,
};
use wavewatch::indicators::IndicatorError;

use crate::fixtures::{buy_closes, declining_closes};

#[test]
fn test_rsi_warmup_masked() {
    let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
    let rsi = calculate_rsi(&closes, 14).unwrap();
    assert!(rsi[..14].iter().all(|v| v.is_nan()));
    assert!(rsi[14..].iter().all(|v| v.is_finite()));
}

#[test]
fn test_rsi_matches_hand_computed_values() {
    // gains 0, 1, 0, 2 and losses 0, 0, 1, 0 smoothed with factor 1/2
    let rsi = calculate_rsi(&[1.0, 2.0, 1.0, 3.0], 2).unwrap();
    assert!(rsi[0].is_nan() && rsi[1].is_nan());
    assert!((rsi[2] - 100.0 / 3.0).abs() < 1e-9, "rsi[2] = {}", rsi[2]);
    assert!((rsi[3] - 900.0 / 11.0).abs() < 1e-9, "rsi[3] = {}", rsi[3]);
}

#[test]
fn test_rsi_large_first_move_does_not_dominate() {
    let mut closes = vec![100.0, 110.0];
    closes.extend((0..30).map(|i| if i % 2 == 0 { 111.0 } else { 110.5 }));
    let rsi = calculate_rsi(&closes, 14).unwrap();
    assert!((rsi[14] - 76.2243).abs() < 1e-3, "rsi[14] = {}", rsi[14]);
    assert!((rsi[20] - 68.4385).abs() < 1e-3, "rsi[20] = {}", rsi[20]);
    assert!((rsi[31] - 56.1606).abs() < 1e-3, "rsi[31] = {}", rsi[31]);
}

#[test]
fn test_rsi_only_gains_is_100() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    assert_eq!(latest_rsi(&closes), Some(100.0));
}

#[test]
fn test_rsi_only_losses_is_0() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
    assert_eq!(latest_rsi(&closes), Some(0.0));
}

#[test]
fn test_rsi_flat_is_neutral() {
    assert_eq!(latest_rsi(&[42.0; 30]), Some(50.0));
}

#[test]
fn test_rsi_insufficient_data() {
    assert_eq!(
        calculate_rsi(&[1.0; 14], 14),
        Err(IndicatorError::InsufficientData {
            required: 15,
            actual: 14
        })
    );
}

#[test]
fn test_stoch_rsi_min_closes() {
    assert_eq!(StochRsiParams::default().min_closes(), 32);
    assert!(matches!(
        calculate_stoch_rsi(&[100.0; 31], &StochRsiParams::default()),
        Err(IndicatorError::InsufficientData {
            required: 32,
            actual: 31
        })
    ));
}

#[test]
fn test_stoch_rsi_flat_resolves_to_midpoint() {
    let stoch = calculate_stoch_rsi(&[100.0; 40], &StochRsiParams::default()).unwrap();
    assert_eq!(stoch.latest_k(), Some(STOCH_MIDPOINT));
    assert_eq!(stoch.latest_d(), Some(STOCH_MIDPOINT));
    assert!(stoch.d[30].is_nan());
    assert!(stoch.d[31].is_finite());
}

#[test]
fn test_stoch_rsi_pins_at_extremes() {
    let params = StochRsiParams::default();
    let falling = calculate_stoch_rsi(&declining_closes(), &params).unwrap();
    assert_eq!(falling.latest_k(), Some(0.0));
    assert_eq!(falling.latest_d(), Some(0.0));

    let rising: Vec<f64> = declining_closes().iter().map(|c| 200.0 - c).collect();
    let rising = calculate_stoch_rsi(&rising, &params).unwrap();
    assert!((rising.latest_k().unwrap() - 100.0).abs() < 1e-9);
    assert!((rising.latest_d().unwrap() - 100.0).abs() < 1e-9);
}

#[test]
fn test_stoch_rsi_on_buy_fixture() {
    let stoch = calculate_stoch_rsi(&buy_closes(), &StochRsiParams::default()).unwrap();
    let k = stoch.latest_k().unwrap();
    let d = stoch.latest_d().unwrap();
    assert!((k - 41.57).abs() < 0.01, "k = {}", k);
    assert!((d - 23.10).abs() < 0.01, "d = {}", d);
}
