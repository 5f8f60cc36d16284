//! Fundamental figures consumed by the valuation and earnings rules.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct EpsReport {
    pub report_date: NaiveDate,
    pub eps: f64,
}

impl EpsReport {
    pub fn new(report_date: NaiveDate, eps: f64) -> Self {
        Self { report_date, eps }
    }
}

/// Latest and previous EPS by report date, ignoring missing figures.
///
/// `None` when fewer than two usable reports exist.
pub fn latest_two_eps(reports: &[EpsReport]) -> Option<(f64, f64)> {
    let mut usable: Vec<&EpsReport> = reports.iter().filter(|r| !r.eps.is_nan()).collect();
    if usable.len() < 2 {
        return None;
    }
    usable.sort_by_key(|r| r.report_date);
    let latest = usable[usable.len() - 1].eps;
    let prev = usable[usable.len() - 2].eps;
    Some((latest, prev))
}

/// Raw market capitalisation converted to reporting units.
pub fn market_cap_in_units(raw: Option<f64>, unit: f64) -> Option<f64> {
    raw.filter(|v| !v.is_nan()).map(|v| v / unit)
}
