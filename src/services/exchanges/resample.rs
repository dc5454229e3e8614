//! Aggregate base-interval candles into a wider timeframe.

use crate::models::{Candle, Timeframe};

/// Groups `candles` (oldest first, at `base` width) into epoch-aligned
/// `target` buckets. A leading bucket that does not start on its boundary
/// or is missing base candles is dropped. The trailing bucket is kept even
/// when still forming.
pub fn resample(candles: &[Candle], target: Timeframe, base: Timeframe) -> Vec<Candle> {
    let per_bucket = (target.seconds() / base.seconds().max(1)).max(1) as usize;
    let mut out: Vec<(Candle, usize)> = Vec::new();

    for candle in candles {
        let bucket = target.bucket_start(candle.timestamp);
        match out.last_mut() {
            Some((agg, count)) if agg.timestamp == bucket => {
                agg.high = agg.high.max(candle.high);
                agg.low = agg.low.min(candle.low);
                agg.close = candle.close;
                agg.volume += candle.volume;
                *count += 1;
            }
            _ => {
                let mut agg = *candle;
                agg.timestamp = bucket;
                out.push((agg, 1));
            }
        }
    }

    if out.len() > 1 {
        let (leading, count) = &out[0];
        let starts_on_boundary = candles
            .first()
            .is_some_and(|c| c.timestamp == leading.timestamp);
        if !starts_on_boundary || *count < per_bucket {
            out.remove(0);
        }
    }

    out.into_iter().map(|(candle, _)| candle).collect()
}
