//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays free for the summary table.
//! `MTFSCREEN_LOG` overrides the configured level with any `EnvFilter`
//! directive, e.g. `MTFSCREEN_LOG=mtfscreen=debug`.

use crate::domain::error::ScreenerError;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "MTFSCREEN_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Result<Self, ScreenerError> {
        match value.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ScreenerError::invalid(
                "logging",
                "format",
                format!("unknown log format '{}', expected text or json", other),
            )),
        }
    }
}

pub fn build_filter(log_level: &str) -> Result<EnvFilter, ScreenerError> {
    let directive = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| log_level.to_string());
    EnvFilter::try_new(&directive).map_err(|e| {
        ScreenerError::invalid("logging", "level", format!("invalid log filter: {}", e))
    })
}

/// Install the global subscriber. A second call leaves the first in place.
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<(), ScreenerError> {
    let filter = build_filter(log_level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!(LogFormat::parse("text").unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::parse(" JSON ").unwrap(), LogFormat::Json);
        assert!(matches!(
            LogFormat::parse("xml"),
            Err(ScreenerError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn accepts_level_and_directives() {
        if std::env::var(LOG_ENV_VAR).is_ok() {
            return;
        }
        assert!(build_filter("info").is_ok());
        assert!(build_filter("mtfscreen=debug,warn").is_ok());
    }

    #[test]
    fn init_twice_is_harmless() {
        assert!(init_tracing("warn", LogFormat::Text).is_ok());
        assert!(init_tracing("warn", LogFormat::Json).is_ok());
    }
}
