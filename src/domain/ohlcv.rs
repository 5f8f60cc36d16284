//! OHLCV bar representation.
//!
//! Missing prices are carried as `NaN`; aggregation skips them the way a
//! sparse data feed expects.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when both open and close are present.
    pub fn is_complete(&self) -> bool {
        !self.open.is_nan() && !self.close.is_nan()
    }
}

/// Parse `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
}

/// Closing prices in bar order.
pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            100.0,
            110.0,
            90.0,
            105.0,
            50_000.0,
        )
    }

    #[test]
    fn complete_bar() {
        assert!(sample_bar().is_complete());
    }

    #[test]
    fn missing_close_is_incomplete() {
        let bar = OhlcvBar {
            close: f64::NAN,
            ..sample_bar()
        };
        assert!(!bar.is_complete());
    }

    #[test]
    fn missing_open_is_incomplete() {
        let bar = OhlcvBar {
            open: f64::NAN,
            ..sample_bar()
        };
        assert!(!bar.is_complete());
    }

    #[test]
    fn parses_both_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 8);
        assert_eq!(parse_date("2024-03-08"), expected);
        assert_eq!(parse_date("20240308"), expected);
        assert_eq!(parse_date(" 2024-03-08 "), expected);
        assert_eq!(parse_date("2024/03/08"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn closes_in_order() {
        let mut second = sample_bar();
        second.close = 107.5;
        assert_eq!(closes(&[sample_bar(), second]), vec![105.0, 107.5]);
    }
}
