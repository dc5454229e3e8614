//! NaN-aware moving-average primitives.
//!
//! Every function returns a series aligned 1:1 with its input. Positions
//! that cannot be computed yet hold `f64::NAN`.

/// Smoothing factor used by [`ema_series`]: 2 / (period + 1)
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Recursive exponential average with an explicit smoothing factor.
///
/// Seeded with the first finite input. Non-finite inputs after the seed
/// hold the previous average.
pub fn smoothed_series(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for &value in values {
        if !value.is_finite() {
            out.push(prev.unwrap_or(f64::NAN));
            continue;
        }
        let next = match prev {
            None => value,
            Some(p) => ema_from_previous(value, p, alpha),
        };
        prev = Some(next);
        out.push(next);
    }

    out
}

/// One EMA step: alpha * value + (1 - alpha) * previous
pub fn ema_from_previous(value: f64, previous: f64, alpha: f64) -> f64 {
    alpha * value + (1.0 - alpha) * previous
}

/// Exponential moving average, smoothing factor 2 / (period + 1).
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    smoothed_series(values, ema_alpha(period))
}

/// Wilder's smoothing (smoothing factor 1 / period), as used by RSI.
pub fn wilder_series(values: &[f64], period: usize) -> Vec<f64> {
    smoothed_series(values, 1.0 / period.max(1) as f64)
}

/// Simple moving average. A window containing any NaN yields NaN.
pub fn sma_series(values: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return f64::NAN;
            }
            let window = &values[i + 1 - period..=i];
            if window.iter().any(|v| !v.is_finite()) {
                f64::NAN
            } else {
                window.iter().sum::<f64>() / period as f64
            }
        })
        .collect()
}

/// Lowest and highest value of each trailing window, `None` while warming up
/// or when the window contains NaN.
pub fn rolling_min_max(values: &[f64], period: usize) -> Vec<Option<(f64, f64)>> {
    let period = period.max(1);
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            if window.iter().any(|v| !v.is_finite()) {
                return None;
            }
            let min = window.iter().copied().fold(f64::INFINITY, f64::min);
            let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some((min, max))
        })
        .collect()
}

/// Overwrites the first `count` values with NaN.
pub fn mask_warmup(values: &mut [f64], count: usize) {
    let end = count.min(values.len());
    for v in &mut values[..end] {
        *v = f64::NAN;
    }
}
