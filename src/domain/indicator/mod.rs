//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, index-aligned with its bars

pub mod ema;
pub mod macd;
pub mod sma;

pub use ema::{calculate_ema, ema_values};
pub use macd::{calculate_macd, calculate_macd_default, MacdParams};
pub use sma::calculate_sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd { dif: f64, dea: f64, hist: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub dif: f64,
    pub dea: f64,
    pub hist: f64,
}

impl MacdValue {
    /// dif - dea
    pub fn spread(&self) -> f64 {
        self.dif - self.dea
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Simple value at `index`, `None` when out of range, invalid, or not a simple series.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        let point = self.values.get(index)?;
        match point.value {
            IndicatorValue::Simple(v) if point.valid => Some(v),
            _ => None,
        }
    }

    pub fn last_simple(&self) -> Option<f64> {
        self.values.len().checked_sub(1).and_then(|i| self.simple_at(i))
    }

    /// All valid simple values in order, dropping undefined positions.
    pub fn valid_simple_values(&self) -> Vec<f64> {
        (0..self.values.len())
            .filter_map(|i| self.simple_at(i))
            .collect()
    }

    pub fn macd_at(&self, index: usize) -> Option<MacdValue> {
        let point = self.values.get(index)?;
        match point.value {
            IndicatorValue::Macd { dif, dea, hist } if point.valid => {
                Some(MacdValue { dif, dea, hist })
            }
            _ => None,
        }
    }

    pub fn last_macd(&self) -> Option<MacdValue> {
        self.values.len().checked_sub(1).and_then(|i| self.macd_at(i))
    }

    /// MACD values in order. Non-MACD series yield an empty vector.
    pub fn macd_values(&self) -> Vec<MacdValue> {
        (0..self.values.len())
            .filter_map(|i| self.macd_at(i))
            .collect()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
