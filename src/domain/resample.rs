//! Calendar resampling of daily bars into weekly, monthly and quarterly bars.
//!
//! Buckets are labelled by their period end. Within a bucket: open = first
//! present open, high = max, low = min, close = last present close,
//! volume = sum. A bucket that ends up without an open or a close is dropped.

use crate::domain::ohlcv::OhlcvBar;
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// Weeks ending Friday.
    Weekly,
    Monthly,
    /// Calendar quarters ending March, June, September and December.
    Quarterly,
}

impl Period {
    /// Last calendar day of the period containing `date`.
    pub fn period_end(self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Weekly => {
                let from_monday = date.weekday().num_days_from_monday();
                let friday = Weekday::Fri.num_days_from_monday();
                let ahead = (friday + 7 - from_monday) % 7;
                date.checked_add_days(Days::new(ahead as u64))
                    .unwrap_or(NaiveDate::MAX)
            }
            Period::Monthly => month_end(date.year(), date.month()),
            Period::Quarterly => {
                let quarter_month = (date.month() - 1) / 3 * 3 + 3;
                month_end(date.year(), quarter_month)
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
            Period::Quarterly => write!(f, "quarterly"),
        }
    }
}

fn month_end(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

struct Bucket {
    end: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Bucket {
    fn start(end: NaiveDate, bar: &OhlcvBar) -> Self {
        let mut bucket = Self {
            end,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            close: f64::NAN,
            volume: 0.0,
        };
        bucket.absorb(bar);
        bucket
    }

    fn absorb(&mut self, bar: &OhlcvBar) {
        if self.open.is_nan() {
            self.open = bar.open;
        }
        // f64::max/min ignore a NaN operand
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        if !bar.close.is_nan() {
            self.close = bar.close;
        }
        if !bar.volume.is_nan() {
            self.volume += bar.volume;
        }
    }

    fn finish(self) -> Option<OhlcvBar> {
        let bar = OhlcvBar::new(
            self.end, self.open, self.high, self.low, self.close, self.volume,
        );
        bar.is_complete().then_some(bar)
    }
}

/// Resample `bars` into `period` buckets.
///
/// Input order does not matter; bars are sorted by date first.
pub fn resample(bars: &[OhlcvBar], period: Period) -> Vec<OhlcvBar> {
    if bars.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&OhlcvBar> = bars.iter().collect();
    sorted.sort_by_key(|b| b.date);

    let mut output = Vec::new();
    let mut bucket: Option<Bucket> = None;

    for bar in sorted {
        let end = period.period_end(bar.date);
        match bucket.as_mut() {
            Some(active) if active.end == end => active.absorb(bar),
            _ => {
                if let Some(done) = bucket.take() {
                    output.extend(done.finish());
                }
                bucket = Some(Bucket::start(end, bar));
            }
        }
    }

    if let Some(done) = bucket {
        output.extend(done.finish());
    }

    output
}

pub fn to_weekly(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    resample(bars, Period::Weekly)
}

pub fn to_monthly(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    resample(bars, Period::Monthly)
}

pub fn to_quarterly(bars: &[OhlcvBar]) -> Vec<OhlcvBar> {
    resample(bars, Period::Quarterly)
}
