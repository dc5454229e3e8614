//! Unit tests for the Heikin-Ashi transform

use chrono::Duration;
use wavewatch::indicators::{heikin_ashi, IndicatorError};
use wavewatch::models::Candle;

use crate::fixtures::{base_time, buy_candles};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_heikin_ashi_recurrences() {
    let t0 = base_time();
    let candles = vec![
        Candle::new(10.0, 12.0, 9.0, 11.0, 1.0, t0),
        Candle::new(11.0, 13.0, 10.0, 12.0, 1.0, t0 + Duration::hours(1)),
    ];
    let ha = heikin_ashi(&candles, 2).unwrap();

    assert_eq!(ha.len(), 2);
    assert!(approx(ha[0].open, 10.5));
    assert!(approx(ha[0].close, 10.5));
    assert!(approx(ha[0].high, 12.0));
    assert!(approx(ha[0].low, 9.0));

    assert!(approx(ha[1].open, 10.5));
    assert!(approx(ha[1].close, 11.5));
    assert!(approx(ha[1].high, 13.0));
    assert!(approx(ha[1].low, 10.0));
    assert_eq!(ha[1].timestamp, candles[1].timestamp);
}

#[test]
fn test_heikin_ashi_high_low_envelope() {
    let ha = heikin_ashi(&buy_candles(), 2).unwrap();
    for c in &ha {
        assert!(c.high >= c.open.max(c.close));
        assert!(c.low <= c.open.min(c.close));
    }
}

#[test]
fn test_heikin_ashi_insufficient_data() {
    let candles = buy_candles();
    assert_eq!(
        heikin_ashi(&candles[..10], 30),
        Err(IndicatorError::InsufficientData {
            required: 30,
            actual: 10
        })
    );
    assert!(matches!(
        heikin_ashi(&candles[..1], 0),
        Err(IndicatorError::InsufficientData { required: 2, .. })
    ));
}
