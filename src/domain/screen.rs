//! Multi-stage screening pipeline.
//!
//! Per security, in roster order:
//!
//! ```text
//! ST → daily data → valuation → earnings → quarterly → monthly → weekly → MA
//! ```
//!
//! The first failing stage ends evaluation. A record carries the verdicts of
//! the stages that ran and a tagged [`Outcome`] naming where it stopped.

use crate::domain::error::ScreenerError;
use crate::domain::fundamentals::{latest_two_eps, market_cap_in_units};
use crate::domain::indicator::{calculate_sma, MacdParams, MacdValue};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::resample::{to_monthly, to_quarterly, to_weekly};
use crate::domain::rule::{DetailValue, Details, RuleVerdict};
use crate::domain::rule_eval::{
    check_eps_growth, check_ma_pattern, check_market_cap, check_monthly_macd,
    check_quarterly_macd, check_weekly_macd, is_special_treatment, MaInputs,
};
use crate::domain::universe::RosterEntry;
use crate::ports::data_port::MarketDataPort;
use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_MARKET_CAP: f64 = 1000.0;
/// Raw currency units per reporting unit (1 亿).
pub const DEFAULT_MARKET_CAP_UNIT: f64 = 100_000_000.0;
pub const DEFAULT_ZERO_NEAR: f64 = 0.05;
pub const DEFAULT_RECENT_QUARTER_K: usize = 2;
pub const DEFAULT_MONTH_TREND_N: usize = 2;
pub const DEFAULT_MA_CONVERGE_PCT: f64 = 0.015;
pub const DEFAULT_MA_SLOPE_N: usize = 20;
pub const DEFAULT_TOP_N: usize = 50;
pub const DEFAULT_LOOKBACK_DAYS: u64 = 3 * 365;

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Ceiling in reporting units.
    pub max_market_cap: f64,
    pub market_cap_unit: f64,
    pub zero_near: f64,
    pub recent_quarter_k: usize,
    pub month_trend_n: usize,
    pub ma_converge_pct: f64,
    pub ma_slope_n: usize,
    /// 0 keeps every record.
    pub top_n: usize,
    pub use_daily: bool,
    pub macd: MacdParams,
}

impl ScreenConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            max_market_cap: DEFAULT_MAX_MARKET_CAP,
            market_cap_unit: DEFAULT_MARKET_CAP_UNIT,
            zero_near: DEFAULT_ZERO_NEAR,
            recent_quarter_k: DEFAULT_RECENT_QUARTER_K,
            month_trend_n: DEFAULT_MONTH_TREND_N,
            ma_converge_pct: DEFAULT_MA_CONVERGE_PCT,
            ma_slope_n: DEFAULT_MA_SLOPE_N,
            top_n: DEFAULT_TOP_N,
            use_daily: false,
            macd: MacdParams::default(),
        }
    }

    /// Window ending at `end_date` covering the default lookback.
    pub fn ending(end_date: NaiveDate) -> Self {
        Self::new(default_start_date(end_date), end_date)
    }
}

pub fn default_start_date(end_date: NaiveDate) -> NaiveDate {
    end_date
        .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
        .unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Valuation,
    Earnings,
    Quarterly,
    Monthly,
    Weekly,
    MaPattern,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Valuation,
        Stage::Earnings,
        Stage::Quarterly,
        Stage::Monthly,
        Stage::Weekly,
        Stage::MaPattern,
    ];

    /// Field-name prefix used when flattening a record.
    pub fn prefix(self) -> &'static str {
        match self {
            Stage::Valuation => "mv",
            Stage::Earnings => "eps",
            Stage::Quarterly => "quarter",
            Stage::Monthly => "month",
            Stage::Weekly => "week",
            Stage::MaPattern => "ma",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Valuation => "valuation",
            Stage::Earnings => "earnings",
            Stage::Quarterly => "quarterly macd",
            Stage::Monthly => "monthly macd",
            Stage::Weekly => "weekly macd",
            Stage::MaPattern => "moving-average pattern",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageVerdict {
    pub stage: Stage,
    pub verdict: RuleVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedAt {
    SpecialTreatment,
    NoDailyData,
    Stage(Stage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Rejected(RejectedAt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningRecord {
    pub code: String,
    pub name: String,
    pub outcome: Outcome,
    /// Verdicts of the stages that ran, in pipeline order.
    pub verdicts: Vec<StageVerdict>,
    /// Latest daily MACD, kept for passing records when requested.
    pub daily: Option<MacdValue>,
}

impl ScreeningRecord {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn status(&self) -> &'static str {
        match self.outcome {
            Outcome::Passed => "passed",
            Outcome::Rejected(_) => "rejected",
        }
    }

    pub fn reason(&self) -> String {
        match self.outcome {
            Outcome::Passed => "all conditions met".to_string(),
            Outcome::Rejected(RejectedAt::SpecialTreatment) => "special treatment".to_string(),
            Outcome::Rejected(RejectedAt::NoDailyData) => "no daily data".to_string(),
            Outcome::Rejected(RejectedAt::Stage(stage)) => self
                .verdict(stage)
                .map(|v| v.reason.clone())
                .unwrap_or_else(|| format!("{} failed", stage)),
        }
    }

    pub fn verdict(&self, stage: Stage) -> Option<&RuleVerdict> {
        self.verdicts
            .iter()
            .find(|sv| sv.stage == stage)
            .map(|sv| &sv.verdict)
    }

    /// Ordered field map: identity and outcome, then each evaluated stage,
    /// then the daily snapshot.
    pub fn to_row(&self) -> Details {
        let mut row = Details::new();
        row.insert("code".to_string(), DetailValue::from(self.code.as_str()));
        row.insert("name".to_string(), DetailValue::from(self.name.as_str()));
        row.insert("status".to_string(), DetailValue::from(self.status()));
        row.insert("reason".to_string(), DetailValue::from(self.reason()));

        for sv in &self.verdicts {
            let prefix = sv.stage.prefix();
            row.insert(format!("{}_pass", prefix), DetailValue::from(sv.verdict.passed));
            row.insert(
                format!("{}_reason", prefix),
                DetailValue::from(sv.verdict.reason.as_str()),
            );
            for (key, value) in &sv.verdict.details {
                row.insert(format!("{}_{}", prefix, key), value.clone());
            }
        }

        if let Some(daily) = self.daily {
            row.insert("daily_dif".to_string(), DetailValue::from(daily.dif));
            row.insert("daily_dea".to_string(), DetailValue::from(daily.dea));
            row.insert("daily_hist".to_string(), DetailValue::from(daily.hist));
        }
        row
    }
}

/// Screen the whole roster.
///
/// A roster fault aborts the run. A market-cap fault degrades to an empty
/// snapshot, so every security fails valuation.
pub fn run_screen(
    port: &dyn MarketDataPort,
    config: &ScreenConfig,
) -> Result<Vec<ScreeningRecord>, ScreenerError> {
    let roster = port.roster()?;
    info!(
        securities = roster.len(),
        start = %config.start_date,
        end = %config.end_date,
        "screen started"
    );

    let caps = port.market_caps().unwrap_or_else(|e| {
        warn!(error = %e, "market cap snapshot unavailable");
        HashMap::new()
    });

    let mut records: Vec<ScreeningRecord> = roster
        .iter()
        .map(|entry| screen_security(port, config, entry, &caps))
        .collect();

    let passed = records.iter().filter(|r| r.passed()).count();
    info!(screened = records.len(), passed, "screen finished");

    if config.top_n > 0 {
        records.truncate(config.top_n);
    }
    Ok(records)
}

/// Screen one security against a market-cap snapshot keyed by code.
pub fn screen_security(
    port: &dyn MarketDataPort,
    config: &ScreenConfig,
    entry: &RosterEntry,
    caps: &HashMap<String, f64>,
) -> ScreeningRecord {
    let mut verdicts = Vec::new();
    let (outcome, daily) = match evaluate(port, config, entry, caps, &mut verdicts) {
        Ok(daily) => (Outcome::Passed, daily),
        Err(at) => (Outcome::Rejected(at), None),
    };

    let record = ScreeningRecord {
        code: entry.code.clone(),
        name: entry.name.clone(),
        outcome,
        verdicts,
        daily,
    };
    debug!(
        code = %record.code,
        status = record.status(),
        reason = %record.reason(),
        "security screened"
    );
    record
}

fn require(
    verdicts: &mut Vec<StageVerdict>,
    stage: Stage,
    verdict: RuleVerdict,
) -> Result<(), RejectedAt> {
    let passed = verdict.passed;
    verdicts.push(StageVerdict { stage, verdict });
    if passed {
        Ok(())
    } else {
        Err(RejectedAt::Stage(stage))
    }
}

fn evaluate(
    port: &dyn MarketDataPort,
    config: &ScreenConfig,
    entry: &RosterEntry,
    caps: &HashMap<String, f64>,
    verdicts: &mut Vec<StageVerdict>,
) -> Result<Option<MacdValue>, RejectedAt> {
    if is_special_treatment(&entry.name) {
        return Err(RejectedAt::SpecialTreatment);
    }

    let bars = fetch_daily(port, config, &entry.code).ok_or(RejectedAt::NoDailyData)?;

    let market_cap = market_cap_in_units(caps.get(&entry.code).copied(), config.market_cap_unit);
    require(
        verdicts,
        Stage::Valuation,
        check_market_cap(market_cap, config.max_market_cap),
    )?;

    let eps = fetch_eps(port, &entry.code);
    require(
        verdicts,
        Stage::Earnings,
        check_eps_growth(eps.map(|e| e.0), eps.map(|e| e.1)),
    )?;

    let quarterly = config.macd.calculate(&to_quarterly(&bars)).macd_values();
    require(
        verdicts,
        Stage::Quarterly,
        check_quarterly_macd(&quarterly, config.zero_near, config.recent_quarter_k),
    )?;

    let monthly = config.macd.calculate(&to_monthly(&bars)).macd_values();
    require(
        verdicts,
        Stage::Monthly,
        check_monthly_macd(&monthly, config.month_trend_n),
    )?;

    let weekly = config.macd.calculate(&to_weekly(&bars)).macd_values();
    require(
        verdicts,
        Stage::Weekly,
        check_weekly_macd(&weekly, config.zero_near),
    )?;

    require(
        verdicts,
        Stage::MaPattern,
        check_ma_pattern(
            &moving_averages(&bars),
            config.ma_converge_pct,
            config.ma_slope_n,
        ),
    )?;

    Ok(config
        .use_daily
        .then(|| config.macd.calculate(&bars).last_macd())
        .flatten())
}

fn fetch_daily(
    port: &dyn MarketDataPort,
    config: &ScreenConfig,
    code: &str,
) -> Option<Vec<OhlcvBar>> {
    match port.daily_bars(code, config.start_date, config.end_date) {
        Ok(Some(bars)) if !bars.is_empty() => Some(bars),
        Ok(_) => None,
        Err(e) => {
            warn!(code, error = %e, "daily bars unavailable");
            None
        }
    }
}

fn fetch_eps(port: &dyn MarketDataPort, code: &str) -> Option<(f64, f64)> {
    match port.quarterly_eps(code) {
        Ok(Some(reports)) => latest_two_eps(&reports),
        Ok(None) => None,
        Err(e) => {
            warn!(code, error = %e, "eps unavailable");
            None
        }
    }
}

fn moving_averages(bars: &[OhlcvBar]) -> MaInputs {
    let ma20 = calculate_sma(bars, 20);
    MaInputs {
        ma5: calculate_sma(bars, 5).last_simple(),
        ma10: calculate_sma(bars, 10).last_simple(),
        ma20: ma20.last_simple(),
        ma20_history: ma20.valid_simple_values(),
    }
}
