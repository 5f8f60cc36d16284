//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first present value, then
//! EMA[i] = X[i]*k + EMA[i-1]*(1-k).
//!
//! A NaN input carries the previous EMA forward and decays its weight by
//! (1-k) per missing step, so the next present value is blended as
//! `(w*EMA + k*X) / (w + k)`. Points before the first present value are
//! NaN and invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{closes, OhlcvBar};

/// EMA over raw values. Empty input or a zero span yields an empty vector.
pub fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || values.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = f64::NAN;
    let mut old_weight = 1.0;

    for &value in values {
        if !ema.is_nan() {
            old_weight *= 1.0 - k;
        }
        if !value.is_nan() {
            ema = if ema.is_nan() {
                value
            } else {
                (old_weight * ema + k * value) / (old_weight + k)
            };
            old_weight = 1.0;
        }
        out.push(ema);
    }

    out
}

pub fn calculate_ema(bars: &[OhlcvBar], span: usize) -> IndicatorSeries {
    let smoothed = ema_values(&closes(bars), span);
    let values = bars
        .iter()
        .zip(smoothed)
        .map(|(bar, ema)| IndicatorPoint {
            date: bar.date,
            valid: !ema.is_nan(),
            value: IndicatorValue::Simple(ema),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}
