//! Core domain types and logic.

pub mod config_validation;
pub mod error;
pub mod fundamentals;
pub mod indicator;
pub mod ohlcv;
pub mod resample;
pub mod rule;
pub mod rule_eval;
pub mod screen;
pub mod universe;
