//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). The first (n-1) points are undefined:
//! `valid` is false and the value is NaN.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], window: usize) -> IndicatorSeries {
    if window == 0 {
        return IndicatorSeries::empty(IndicatorType::Sma(window));
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= window {
            sum -= bars[i - window].close;
        }

        let valid = i + 1 >= window;
        let value = if valid {
            // NaN sticks in the running sum; recompute the window instead.
            if sum.is_nan() {
                bars[i + 1 - window..=i].iter().map(|b| b.close).sum::<f64>() / window as f64
            } else {
                sum / window as f64
            }
        } else {
            f64::NAN
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: valid && !value.is_nan(),
            value: IndicatorValue::Simple(value),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(window),
        values,
    }
}
