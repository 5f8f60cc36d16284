//! CSV snapshot directory adapter.
//!
//! ```text
//! <dir>/roster.csv          code,name
//! <dir>/market_caps.csv     code,total_mv
//! <dir>/daily/<code>.csv    date,open,high,low,close,volume
//! <dir>/eps/<code>.csv      report_date,eps
//! ```

use crate::domain::error::ScreenerError;
use crate::domain::fundamentals::EpsReport;
use crate::domain::ohlcv::{parse_date, OhlcvBar};
use crate::domain::universe::{RosterEntry, RosterPolicy};
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
    policy: RosterPolicy,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct MarketCapRow {
    code: String,
    total_mv: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyRow {
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EpsRow {
    report_date: String,
    eps: Option<f64>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, policy: RosterPolicy) -> Self {
        Self { base_path, policy }
    }

    /// Every roster row as written, before the inclusion policy.
    pub fn all_entries(&self) -> Result<Vec<RosterEntry>, ScreenerError> {
        let path = self.base_path.join("roster.csv");
        let rows: Vec<RosterRow> = read_rows(&path)?.ok_or_else(|| {
            ScreenerError::data_source(format!("roster not found: {}", path.display()))
        })?;
        Ok(rows
            .into_iter()
            .map(|r| RosterEntry {
                code: r.code.trim().to_string(),
                name: r.name.trim().to_string(),
            })
            .collect())
    }

    fn daily_path(&self, code: &str) -> PathBuf {
        self.base_path.join("daily").join(format!("{}.csv", code))
    }

    fn eps_path(&self, code: &str) -> PathBuf {
        self.base_path.join("eps").join(format!("{}.csv", code))
    }
}

/// Rows of a headed CSV file, `None` when the file does not exist.
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, ScreenerError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ScreenerError::data_source(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )));
        }
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: T = result.map_err(|e| {
            ScreenerError::data_source(format!("CSV parse error in {}: {}", path.display(), e))
        })?;
        rows.push(row);
    }
    Ok(Some(rows))
}

fn row_date(value: &str, path: &Path) -> Result<NaiveDate, ScreenerError> {
    parse_date(value).ok_or_else(|| {
        ScreenerError::data_source(format!("invalid date '{}' in {}", value, path.display()))
    })
}

impl MarketDataPort for CsvAdapter {
    fn roster(&self) -> Result<Vec<RosterEntry>, ScreenerError> {
        Ok(self.policy.apply(self.all_entries()?))
    }

    fn daily_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<Vec<OhlcvBar>>, ScreenerError> {
        let path = self.daily_path(code);
        let Some(rows) = read_rows::<DailyRow>(&path)? else {
            return Ok(None);
        };

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            let date = row_date(&row.date, &path)?;
            if date < start_date || date > end_date {
                continue;
            }
            bars.push(OhlcvBar::new(
                date,
                row.open.unwrap_or(f64::NAN),
                row.high.unwrap_or(f64::NAN),
                row.low.unwrap_or(f64::NAN),
                row.close.unwrap_or(f64::NAN),
                row.volume.unwrap_or(f64::NAN),
            ));
        }

        if bars.is_empty() {
            return Ok(None);
        }
        bars.sort_by_key(|b| b.date);
        Ok(Some(bars))
    }

    fn market_caps(&self) -> Result<HashMap<String, f64>, ScreenerError> {
        let path = self.base_path.join("market_caps.csv");
        let rows: Vec<MarketCapRow> = read_rows(&path)?.unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter_map(|r| r.total_mv.map(|mv| (r.code, mv)))
            .collect())
    }

    fn quarterly_eps(&self, code: &str) -> Result<Option<Vec<EpsReport>>, ScreenerError> {
        let path = self.eps_path(code);
        let Some(rows) = read_rows::<EpsRow>(&path)? else {
            return Ok(None);
        };

        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(eps) = row.eps else { continue };
            reports.push(EpsReport::new(row_date(&row.report_date, &path)?, eps));
        }
        Ok(Some(reports))
    }
}
