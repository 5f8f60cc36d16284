//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! DIF = EMA(close, fast) - EMA(close, slow)
//! DEA = EMA(DIF, signal)
//! HIST = 2 * (DIF - DEA)
//!
//! Default parameters: fast=12, slow=26, signal=9. Every EMA is seeded from
//! its first present input, so points are valid from the first present
//! close onward; a missing close later in the series is carried over.

use crate::domain::indicator::{
    ema_values, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::{closes, OhlcvBar};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    pub fn calculate(&self, bars: &[OhlcvBar]) -> IndicatorSeries {
        calculate_macd(bars, self.fast, self.slow, self.signal)
    }
}

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let close = closes(bars);
    let ema_fast = ema_values(&close, fast);
    let ema_slow = ema_values(&close, slow);

    let dif: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let dea = ema_values(&dif, signal_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            valid: !dif[i].is_nan() && !dea[i].is_nan(),
            value: IndicatorValue::Macd {
                dif: dif[i],
                dea: dea[i],
                hist: 2.0 * (dif[i] - dea[i]),
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> IndicatorSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
