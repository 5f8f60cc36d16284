//! Screening rules.
//!
//! Each check is a pure function of its inputs and returns a [`RuleVerdict`]
//! whose details name every value the decision looked at.
//!
//! # Evaluation Semantics
//!
//! - Golden cross: `dif[prev] <= dea[prev] && dif[cur] > dea[cur]`
//! - "Near zero": a value `>= -zero_near`
//! - Crossover offsets count back from the latest bar; offset 1 is the latest bar

use crate::domain::indicator::MacdValue;
use crate::domain::rule::RuleVerdict;

/// Special-treatment (ST, *ST) designation in the display name.
pub fn is_special_treatment(name: &str) -> bool {
    name.to_uppercase().contains("ST")
}

pub fn check_market_cap(market_cap: Option<f64>, max_market_cap: f64) -> RuleVerdict {
    let Some(market_cap) = market_cap.filter(|v| !v.is_nan()) else {
        return RuleVerdict::fail("market cap unavailable")
            .with("market_cap", None::<f64>)
            .with("max_market_cap", max_market_cap);
    };

    RuleVerdict::decide(
        market_cap < max_market_cap,
        "market cap within limit",
        "market cap above limit",
    )
    .with("market_cap", market_cap)
    .with("max_market_cap", max_market_cap)
}

pub fn check_eps_growth(eps_latest: Option<f64>, eps_prev: Option<f64>) -> RuleVerdict {
    let (Some(latest), Some(prev)) = (eps_latest, eps_prev) else {
        return RuleVerdict::fail("eps unavailable")
            .with("eps_latest", eps_latest)
            .with("eps_prev", eps_prev);
    };

    RuleVerdict::decide(
        latest > 0.0 && latest > prev,
        "eps positive and growing",
        "eps not positive or not growing",
    )
    .with("eps_latest", latest)
    .with("eps_prev", prev)
}

/// Offset back from the latest bar of the most recent golden cross within
/// `recent_k` bars. A later death cross does not cancel it.
pub fn find_recent_golden_cross(macd: &[MacdValue], recent_k: usize) -> Option<usize> {
    if macd.len() < 2 {
        return None;
    }

    let len = macd.len();
    (1..=recent_k.min(len - 1)).find(|&offset| {
        let current = &macd[len - offset];
        let previous = &macd[len - offset - 1];
        previous.dif <= previous.dea && current.dif > current.dea
    })
}

pub fn check_quarterly_macd(macd: &[MacdValue], zero_near: f64, recent_k: usize) -> RuleVerdict {
    if macd.is_empty() {
        return RuleVerdict::fail("quarterly macd unavailable").with("bars", 0usize);
    }

    let Some(offset) = find_recent_golden_cross(macd, recent_k) else {
        return RuleVerdict::fail("no recent quarterly golden cross")
            .with("recent_cross", None::<usize>)
            .with("recent_k", recent_k);
    };

    let at_cross = &macd[macd.len() - offset];
    let near_zero = at_cross.dif >= -zero_near || at_cross.dea >= -zero_near;

    RuleVerdict::decide(
        near_zero,
        "quarterly golden cross",
        "quarterly golden cross below zero line",
    )
    .with("dif", at_cross.dif)
    .with("dea", at_cross.dea)
    .with("recent_cross", offset)
    .with("zero_near", zero_near)
    .with("recent_k", recent_k)
}

pub fn check_monthly_macd(macd: &[MacdValue], trend_n: usize) -> RuleVerdict {
    let trend_n = trend_n.max(1);
    if macd.is_empty() {
        return RuleVerdict::fail("monthly macd unavailable")
            .with("bars", 0usize)
            .with("trend_n", trend_n);
    }
    if macd.len() < trend_n.max(2) {
        return RuleVerdict::fail("insufficient monthly macd data")
            .with("bars", macd.len())
            .with("trend_n", trend_n);
    }

    let spreads: Vec<f64> = macd.iter().map(MacdValue::spread).collect();
    let latest = &macd[macd.len() - 1];
    let spread = spreads[spreads.len() - 1];
    let spread_prev = spreads[spreads.len() - 2];

    let trend_ok = if trend_n > 1 {
        spreads[spreads.len() - trend_n..]
            .windows(2)
            .all(|w| w[1] - w[0] > 0.0)
    } else {
        spread > spread_prev
    };

    RuleVerdict::decide(
        latest.dif > 0.0 && latest.dea > 0.0 && trend_ok,
        "monthly macd widening above zero",
        "monthly macd not widening above zero",
    )
    .with("dif", latest.dif)
    .with("dea", latest.dea)
    .with("spread", spread)
    .with("spread_prev", spread_prev)
    .with("trend_n", trend_n)
    .with("trend_ok", trend_ok)
}

pub fn check_weekly_macd(macd: &[MacdValue], zero_near: f64) -> RuleVerdict {
    let Some(latest) = macd.last() else {
        return RuleVerdict::fail("weekly macd unavailable").with("bars", 0usize);
    };

    RuleVerdict::decide(
        latest.dif >= -zero_near || latest.dea >= -zero_near,
        "weekly macd near zero line",
        "weekly macd below zero line",
    )
    .with("dif", latest.dif)
    .with("dea", latest.dea)
    .with("zero_near", zero_near)
}

/// Moving-average inputs taken from the daily series.
#[derive(Debug, Clone, Default)]
pub struct MaInputs {
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    /// Defined MA20 values in bar order.
    pub ma20_history: Vec<f64>,
}

pub fn check_ma_pattern(inputs: &MaInputs, converge_pct: f64, slope_n: usize) -> RuleVerdict {
    let (Some(ma5), Some(ma10), Some(ma20)) = (inputs.ma5, inputs.ma10, inputs.ma20) else {
        return RuleVerdict::fail("insufficient moving-average data")
            .with("ma5", inputs.ma5)
            .with("ma10", inputs.ma10)
            .with("ma20", inputs.ma20);
    };

    let threshold = ma20 * converge_pct;
    let converge = (ma5 - ma10).abs() <= threshold
        && (ma5 - ma20).abs() <= threshold
        && (ma10 - ma20).abs() <= threshold;

    let history = &inputs.ma20_history;
    let ma20_ref =
        (slope_n >= 1 && history.len() >= slope_n).then(|| history[history.len() - slope_n]);
    let slope_ok = match (ma20_ref, history.last()) {
        (Some(reference), Some(&latest)) => latest > reference,
        _ => false,
    };
    let bull = ma5 > ma10 && ma10 > ma20 && slope_ok;

    let reason = if converge {
        "moving averages converging"
    } else if bull {
        "moving averages in bullish alignment"
    } else {
        "moving-average pattern not met"
    };

    RuleVerdict::decide(converge || bull, reason, reason)
        .with("ma5", ma5)
        .with("ma10", ma10)
        .with("ma20", ma20)
        .with("converge_threshold", threshold)
        .with("converge", converge)
        .with("bull", bull)
        .with("slope_ok", slope_ok)
        .with("slope_n", slope_n)
        .with("ma20_ref", ma20_ref)
}
