#![allow(dead_code)]

use chrono::{Datelike, Days, NaiveDate, Weekday};
use mtfscreen::domain::error::ScreenerError;
use mtfscreen::domain::fundamentals::EpsReport;
pub use mtfscreen::domain::ohlcv::OhlcvBar;
use mtfscreen::domain::screen::ScreenConfig;
use mtfscreen::domain::universe::RosterEntry;
use mtfscreen::ports::data_port::MarketDataPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// In-memory collaborator with per-call fault injection and a call log.
pub struct MockDataPort {
    pub roster: Vec<RosterEntry>,
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub caps: HashMap<String, f64>,
    pub eps: HashMap<String, Vec<EpsReport>>,
    pub roster_error: Option<String>,
    pub caps_error: Option<String>,
    pub bar_errors: HashMap<String, String>,
    pub eps_errors: HashMap<String, String>,
    pub calls: RefCell<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            roster: Vec::new(),
            bars: HashMap::new(),
            caps: HashMap::new(),
            eps: HashMap::new(),
            roster_error: None,
            caps_error: None,
            bar_errors: HashMap::new(),
            eps_errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_entry(mut self, code: &str, name: &str) -> Self {
        self.roster.push(RosterEntry::new(code, name));
        self
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.bars.insert(code.to_string(), bars);
        self
    }

    /// Market cap in raw currency units.
    pub fn with_cap(mut self, code: &str, total_mv: f64) -> Self {
        self.caps.insert(code.to_string(), total_mv);
        self
    }

    /// EPS figures oldest first, one per quarter end from 2023-03-31.
    pub fn with_eps(mut self, code: &str, figures: &[f64]) -> Self {
        let reports = figures
            .iter()
            .enumerate()
            .map(|(i, &eps)| EpsReport::new(quarter_end(i), eps))
            .collect();
        self.eps.insert(code.to_string(), reports);
        self
    }

    pub fn with_roster_error(mut self, reason: &str) -> Self {
        self.roster_error = Some(reason.to_string());
        self
    }

    pub fn with_caps_error(mut self, reason: &str) -> Self {
        self.caps_error = Some(reason.to_string());
        self
    }

    pub fn with_bar_error(mut self, code: &str, reason: &str) -> Self {
        self.bar_errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn with_eps_error(mut self, code: &str, reason: &str) -> Self {
        self.eps_errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn calls_for(&self, code: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.ends_with(&format!(":{}", code)))
            .cloned()
            .collect()
    }

    fn log(&self, call: &str, code: &str) {
        self.calls.borrow_mut().push(format!("{}:{}", call, code));
    }
}

impl MarketDataPort for MockDataPort {
    fn roster(&self) -> Result<Vec<RosterEntry>, ScreenerError> {
        match &self.roster_error {
            Some(reason) => Err(ScreenerError::data_source(reason.clone())),
            None => Ok(self.roster.clone()),
        }
    }

    fn daily_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<Vec<OhlcvBar>>, ScreenerError> {
        self.log("daily_bars", code);
        if let Some(reason) = self.bar_errors.get(code) {
            return Err(ScreenerError::data_source(reason.clone()));
        }
        let bars: Vec<OhlcvBar> = self
            .bars
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok((!bars.is_empty()).then_some(bars))
    }

    fn market_caps(&self) -> Result<HashMap<String, f64>, ScreenerError> {
        match &self.caps_error {
            Some(reason) => Err(ScreenerError::data_source(reason.clone())),
            None => Ok(self.caps.clone()),
        }
    }

    fn quarterly_eps(&self, code: &str) -> Result<Option<Vec<EpsReport>>, ScreenerError> {
        self.log("quarterly_eps", code);
        if let Some(reason) = self.eps_errors.get(code) {
            return Err(ScreenerError::data_source(reason.clone()));
        }
        Ok(self.eps.get(code).cloned())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn quarter_end(index: usize) -> NaiveDate {
    let ends = [(3, 31), (6, 30), (9, 30), (12, 31)];
    let (m, d) = ends[index % 4];
    date(2023 + (index / 4) as i32, m, d)
}

/// `count` consecutive weekdays starting on or after `start`.
pub fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut day = start;
    while dates.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day = day.checked_add_days(Days::new(1)).unwrap();
    }
    dates
}

/// Steady compounding uptrend: close grows by `rate` every trading day.
pub fn uptrend_bars(start: NaiveDate, count: usize, base: f64, rate: f64) -> Vec<OhlcvBar> {
    weekdays(start, count)
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let close = base * (1.0 + rate).powi(i as i32);
            OhlcvBar::new(d, close * 0.995, close * 1.01, close * 0.99, close, 1_000.0)
        })
        .collect()
}

/// Weekdays from 2021-01-04 through 2023-11-30.
pub const STANDARD_UPTREND_LEN: usize = 759;

/// About three years of daily bars ending on a month end, so the last
/// monthly bar is a full month.
pub fn standard_uptrend() -> Vec<OhlcvBar> {
    uptrend_bars(date(2021, 1, 4), STANDARD_UPTREND_LEN, 10.0, 0.002)
}

/// Window covering [`standard_uptrend`] with every other parameter at its
/// default.
pub fn standard_config() -> ScreenConfig {
    let mut config = ScreenConfig::new(date(2021, 1, 1), date(2023, 12, 31));
    config.top_n = 0;
    config
}

/// Config under which [`standard_uptrend`] passes every stage.
pub fn passing_config() -> ScreenConfig {
    ScreenConfig {
        recent_quarter_k: 100,
        ..standard_config()
    }
}

/// Security that passes every stage under [`passing_config`].
pub fn with_passing_security(port: MockDataPort, code: &str, name: &str) -> MockDataPort {
    port.with_entry(code, name)
        .with_bars(code, standard_uptrend())
        .with_cap(code, 5.0e10)
        .with_eps(code, &[0.3, 0.5, 0.8])
}

/// Write a CSV snapshot directory for `port`'s contents.
pub fn write_snapshot(dir: &Path, port: &MockDataPort) {
    fs::create_dir_all(dir.join("daily")).unwrap();
    fs::create_dir_all(dir.join("eps")).unwrap();

    let mut roster = String::from("code,name\n");
    for entry in &port.roster {
        roster.push_str(&format!("{},{}\n", entry.code, entry.name));
    }
    fs::write(dir.join("roster.csv"), roster).unwrap();

    let mut caps = String::from("code,total_mv\n");
    let mut codes: Vec<&String> = port.caps.keys().collect();
    codes.sort();
    for code in codes {
        caps.push_str(&format!("{},{}\n", code, port.caps[code]));
    }
    fs::write(dir.join("market_caps.csv"), caps).unwrap();

    for (code, bars) in &port.bars {
        let mut body = String::from("date,open,high,low,close,volume\n");
        for b in bars {
            body.push_str(&format!(
                "{},{},{},{},{},{}\n",
                b.date, b.open, b.high, b.low, b.close, b.volume
            ));
        }
        fs::write(dir.join("daily").join(format!("{}.csv", code)), body).unwrap();
    }

    for (code, reports) in &port.eps {
        let mut body = String::from("report_date,eps\n");
        for r in reports {
            body.push_str(&format!("{},{}\n", r.report_date, r.eps));
        }
        fs::write(dir.join("eps").join(format!("{}.csv", code)), body).unwrap();
    }
}
