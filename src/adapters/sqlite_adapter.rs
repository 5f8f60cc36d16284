//! SQLite snapshot adapter.
//!
//! Tables: `roster`, `ohlcv`, `market_cap`, `eps`. Dates are stored as
//! `YYYY-MM-DD` text; missing prices are stored as NULL and read back as NaN.

use crate::domain::error::ScreenerError;
use crate::domain::fundamentals::EpsReport;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::universe::{RosterEntry, RosterPolicy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::collections::HashMap;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
    policy: RosterPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub securities: usize,
    pub bars: usize,
    pub market_caps: usize,
    pub eps_reports: usize,
}

fn pool_error(e: r2d2::Error) -> ScreenerError {
    ScreenerError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> ScreenerError {
    ScreenerError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_stored_date(value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            value.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn present(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| ScreenerError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;
        let policy = RosterPolicy {
            include_bj: config.get_bool("data", "include_bj", false),
        };

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool, policy })
    }

    pub fn in_memory() -> Result<Self, ScreenerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self {
            pool,
            policy: RosterPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: RosterPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScreenerError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), ScreenerError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS roster (
                    position INTEGER NOT NULL,
                    code TEXT PRIMARY KEY,
                    name TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS ohlcv (
                    code TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL,
                    high REAL,
                    low REAL,
                    close REAL,
                    volume REAL,
                    PRIMARY KEY (code, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);
                CREATE TABLE IF NOT EXISTS market_cap (
                    code TEXT PRIMARY KEY,
                    total_mv REAL NOT NULL
                );
                CREATE TABLE IF NOT EXISTS eps (
                    code TEXT NOT NULL,
                    report_date TEXT NOT NULL,
                    eps REAL NOT NULL,
                    PRIMARY KEY (code, report_date)
                );",
            )
            .map_err(query_error)
    }

    /// Replace the roster, keeping the given listing order.
    pub fn insert_roster(&self, entries: &[RosterEntry]) -> Result<(), ScreenerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        tx.execute("DELETE FROM roster", []).map_err(query_error)?;
        for (position, entry) in entries.iter().enumerate() {
            tx.execute(
                "INSERT OR REPLACE INTO roster (position, code, name) VALUES (?1, ?2, ?3)",
                params![position as i64, entry.code, entry.name],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)
    }

    pub fn insert_bars(&self, code: &str, bars: &[OhlcvBar]) -> Result<(), ScreenerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (code, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    code,
                    bar.date.format(DATE_FORMAT).to_string(),
                    present(bar.open),
                    present(bar.high),
                    present(bar.low),
                    present(bar.close),
                    present(bar.volume)
                ],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)
    }

    pub fn insert_market_caps(&self, caps: &HashMap<String, f64>) -> Result<(), ScreenerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        for (code, total_mv) in caps.iter().filter(|(_, v)| !v.is_nan()) {
            tx.execute(
                "INSERT OR REPLACE INTO market_cap (code, total_mv) VALUES (?1, ?2)",
                params![code, total_mv],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)
    }

    pub fn insert_eps(&self, code: &str, reports: &[EpsReport]) -> Result<(), ScreenerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        for report in reports.iter().filter(|r| !r.eps.is_nan()) {
            tx.execute(
                "INSERT OR REPLACE INTO eps (code, report_date, eps) VALUES (?1, ?2, ?3)",
                params![
                    code,
                    report.report_date.format(DATE_FORMAT).to_string(),
                    report.eps
                ],
            )
            .map_err(query_error)?;
        }
        tx.commit().map_err(query_error)
    }

    /// Copy `entries` and everything `source` holds for them.
    pub fn import_from(
        &self,
        entries: &[RosterEntry],
        source: &dyn MarketDataPort,
    ) -> Result<ImportStats, ScreenerError> {
        let mut stats = ImportStats {
            securities: entries.len(),
            ..ImportStats::default()
        };
        self.insert_roster(entries)?;

        let caps = source.market_caps()?;
        stats.market_caps = caps.len();
        self.insert_market_caps(&caps)?;

        // four-digit years keep text comparison in date order
        let start = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);

        for entry in entries {
            if let Some(bars) = source.daily_bars(&entry.code, start, end)? {
                stats.bars += bars.len();
                self.insert_bars(&entry.code, &bars)?;
            }
            if let Some(reports) = source.quarterly_eps(&entry.code)? {
                stats.eps_reports += reports.len();
                self.insert_eps(&entry.code, &reports)?;
            }
            debug!(code = %entry.code, "imported");
        }
        Ok(stats)
    }
}

impl MarketDataPort for SqliteAdapter {
    fn roster(&self) -> Result<Vec<RosterEntry>, ScreenerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT code, name FROM roster ORDER BY position")
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RosterEntry {
                    code: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(query_error)?;

        let entries = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_error)?;
        Ok(self.policy.apply(entries))
    }

    fn daily_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<Vec<OhlcvBar>>, ScreenerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM ohlcv
                 WHERE code = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let start_str = start_date.format(DATE_FORMAT).to_string();
        let end_str = end_date.format(DATE_FORMAT).to_string();
        let rows = stmt
            .query_map(params![code, start_str, end_str], |row| {
                let price = |i: usize| -> rusqlite::Result<f64> {
                    Ok(row.get::<_, Option<f64>>(i)?.unwrap_or(f64::NAN))
                };
                Ok(OhlcvBar::new(
                    parse_stored_date(row.get(0)?)?,
                    price(1)?,
                    price(2)?,
                    price(3)?,
                    price(4)?,
                    price(5)?,
                ))
            })
            .map_err(query_error)?;

        let bars = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_error)?;
        Ok((!bars.is_empty()).then_some(bars))
    }

    fn market_caps(&self) -> Result<HashMap<String, f64>, ScreenerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT code, total_mv FROM market_cap")
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))
            .map_err(query_error)?;

        rows.collect::<rusqlite::Result<HashMap<_, _>>>()
            .map_err(query_error)
    }

    fn quarterly_eps(&self, code: &str) -> Result<Option<Vec<EpsReport>>, ScreenerError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT report_date, eps FROM eps WHERE code = ?1 ORDER BY report_date")
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![code], |row| {
                Ok(EpsReport::new(parse_stored_date(row.get(0)?)?, row.get(1)?))
            })
            .map_err(query_error)?;

        let reports = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_error)?;
        Ok((!reports.is_empty()).then_some(reports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        let result = SqliteAdapter::from_config(&EmptyConfig);
        match result {
            Err(ScreenerError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn initialize_schema_is_idempotent() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn roster_keeps_listing_order_and_policy() {
        let adapter = adapter();
        adapter
            .insert_roster(&[
                RosterEntry::new("600519", "贵州茅台"),
                RosterEntry::new("830799", "艾融软件"),
                RosterEntry::new("000001", "平安银行"),
            ])
            .unwrap();

        let codes: Vec<String> = adapter.roster().unwrap().into_iter().map(|e| e.code).collect();
        assert_eq!(codes, vec!["600519", "000001"]);

        let adapter = adapter.with_policy(RosterPolicy { include_bj: true });
        assert_eq!(adapter.roster().unwrap().len(), 3);
    }

    #[test]
    fn daily_bars_round_trip_missing_prices() {
        let adapter = adapter();
        adapter
            .insert_bars(
                "000001",
                &[
                    OhlcvBar::new(date(2024, 1, 3), 10.5, 11.0, 10.0, f64::NAN, 1500.0),
                    OhlcvBar::new(date(2024, 1, 2), 10.0, 10.8, 9.9, 10.4, 1000.0),
                ],
            )
            .unwrap();

        let bars = adapter
            .daily_bars("000001", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap()
            .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(2024, 1, 2));
        assert_eq!(bars[0].close, 10.4);
        assert!(bars[1].close.is_nan());
        assert_eq!(bars[1].volume, 1500.0);
    }

    #[test]
    fn daily_bars_outside_range_is_unavailable() {
        let adapter = adapter();
        adapter
            .insert_bars(
                "000001",
                &[OhlcvBar::new(date(2024, 1, 2), 10.0, 10.8, 9.9, 10.4, 1000.0)],
            )
            .unwrap();

        let bars = adapter
            .daily_bars("000001", date(2023, 1, 1), date(2023, 12, 31))
            .unwrap();
        assert!(bars.is_none());
        assert!(adapter
            .daily_bars("600000", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap()
            .is_none());
    }

    #[test]
    fn market_caps_snapshot() {
        let adapter = adapter();
        let caps = HashMap::from([
            ("000001".to_string(), 2.1e11),
            ("600000".to_string(), f64::NAN),
        ]);
        adapter.insert_market_caps(&caps).unwrap();

        let stored = adapter.market_caps().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored["000001"], 2.1e11);
    }

    #[test]
    fn import_copies_snapshot() {
        let source = adapter();
        source
            .insert_bars(
                "000001",
                &[
                    OhlcvBar::new(date(2024, 1, 2), 10.0, 10.8, 9.9, 10.4, 1000.0),
                    OhlcvBar::new(date(2024, 1, 3), 10.4, 10.9, 10.1, 10.6, 1200.0),
                ],
            )
            .unwrap();
        source
            .insert_market_caps(&HashMap::from([("000001".to_string(), 2.1e11)]))
            .unwrap();
        source
            .insert_eps("000001", &[EpsReport::new(date(2024, 3, 31), 0.5)])
            .unwrap();

        let target = adapter();
        let entries = vec![
            RosterEntry::new("000001", "平安银行"),
            RosterEntry::new("600000", "浦发银行"),
        ];
        let stats = target.import_from(&entries, &source).unwrap();

        assert_eq!(
            stats,
            ImportStats {
                securities: 2,
                bars: 2,
                market_caps: 1,
                eps_reports: 1,
            }
        );
        assert_eq!(target.roster().unwrap(), entries);
        assert_eq!(target.market_caps().unwrap()["000001"], 2.1e11);
    }

    #[test]
    fn eps_sorted_by_report_date() {
        let adapter = adapter();
        adapter
            .insert_eps(
                "000001",
                &[
                    EpsReport::new(date(2024, 6, 30), 0.8),
                    EpsReport::new(date(2024, 3, 31), 0.5),
                ],
            )
            .unwrap();

        let reports = adapter.quarterly_eps("000001").unwrap().unwrap();
        assert_eq!(reports[0].report_date, date(2024, 3, 31));
        assert_eq!(reports[1].eps, 0.8);
        assert!(adapter.quarterly_eps("600000").unwrap().is_none());
    }
}
