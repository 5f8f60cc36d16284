//! Market data collaborator port.
//!
//! `Ok(None)` means the data is unavailable for that security; `Err` means
//! the collaborator itself failed.

use crate::domain::error::ScreenerError;
use crate::domain::fundamentals::EpsReport;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::universe::RosterEntry;
use chrono::NaiveDate;
use std::collections::HashMap;

pub trait MarketDataPort {
    /// Screening universe in listing order, inclusion policy applied.
    fn roster(&self) -> Result<Vec<RosterEntry>, ScreenerError>;

    /// Daily bars in `[start_date, end_date]`, sorted by date.
    fn daily_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Option<Vec<OhlcvBar>>, ScreenerError>;

    /// Total market capitalisation per code, in raw currency units.
    fn market_caps(&self) -> Result<HashMap<String, f64>, ScreenerError>;

    fn quarterly_eps(&self, code: &str) -> Result<Option<Vec<EpsReport>>, ScreenerError>;
}
