//! Screening configuration validation.
//!
//! Runs on the resolved [`ScreenConfig`], after file values and command-line
//! overrides have been merged, so every violation names the INI key it
//! belongs to.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreenConfig;

pub fn validate_screen_config(config: &ScreenConfig) -> Result<(), ScreenerError> {
    validate_dates(config)?;
    validate_market_cap(config)?;
    validate_thresholds(config)?;
    validate_windows(config)?;
    validate_macd(config)?;
    Ok(())
}

fn validate_dates(config: &ScreenConfig) -> Result<(), ScreenerError> {
    if config.start_date >= config.end_date {
        return Err(ScreenerError::invalid(
            "screen",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_market_cap(config: &ScreenConfig) -> Result<(), ScreenerError> {
    if !(config.max_market_cap > 0.0) {
        return Err(ScreenerError::invalid(
            "screen",
            "max_market_cap",
            "max_market_cap must be positive",
        ));
    }
    if !(config.market_cap_unit > 0.0) {
        return Err(ScreenerError::invalid(
            "screen",
            "market_cap_unit",
            "market_cap_unit must be positive",
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &ScreenConfig) -> Result<(), ScreenerError> {
    if !(config.zero_near >= 0.0) {
        return Err(ScreenerError::invalid(
            "screen",
            "zero_near",
            "zero_near must be non-negative",
        ));
    }
    if !(config.ma_converge_pct >= 0.0) {
        return Err(ScreenerError::invalid(
            "screen",
            "ma_converge_pct",
            "ma_converge_pct must be non-negative",
        ));
    }
    Ok(())
}

fn validate_windows(config: &ScreenConfig) -> Result<(), ScreenerError> {
    let windows = [
        ("recent_quarter_k", config.recent_quarter_k),
        ("month_trend_n", config.month_trend_n),
        ("ma_slope_n", config.ma_slope_n),
    ];
    for (key, value) in windows {
        if value < 1 {
            return Err(ScreenerError::invalid(
                "screen",
                key,
                format!("{} must be at least 1", key),
            ));
        }
    }
    Ok(())
}

fn validate_macd(config: &ScreenConfig) -> Result<(), ScreenerError> {
    let macd = config.macd;
    if macd.fast == 0 {
        return Err(ScreenerError::invalid("macd", "fast", "fast must be positive"));
    }
    if macd.fast >= macd.slow {
        return Err(ScreenerError::invalid(
            "macd",
            "slow",
            "slow must be greater than fast",
        ));
    }
    if macd.signal == 0 {
        return Err(ScreenerError::invalid(
            "macd",
            "signal",
            "signal must be positive",
        ));
    }
    Ok(())
}
