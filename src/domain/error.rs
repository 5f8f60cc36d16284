//! Domain error types.

/// Top-level error type for mtfscreen.
///
/// Only faults that stop the whole run surface here. Missing data for a
/// single security is never an error; it becomes a failing verdict.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("report error for {path}: {reason}")]
    Report { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScreenerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn data_source(reason: impl Into<String>) -> Self {
        ScreenerError::DataSource {
            reason: reason.into(),
        }
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) | ScreenerError::Report { .. } => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::DataSource { .. }
            | ScreenerError::Database { .. }
            | ScreenerError::DatabaseQuery { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn config_invalid_message() {
        let err = ScreenerError::invalid("screen", "zero_near", "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid config value [screen] zero_near: must be non-negative"
        );
    }

    #[test]
    fn data_source_message() {
        let err = ScreenerError::data_source("roster.csv missing");
        assert_eq!(err.to_string(), "data source error: roster.csv missing");
    }

    #[test]
    fn exit_codes_follow_taxonomy() {
        let config = ScreenerError::ConfigMissing {
            section: "csv".into(),
            key: "dir".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));

        let data = ScreenerError::data_source("boom");
        assert_eq!(ExitCode::from(&data), ExitCode::from(3));

        let io = ScreenerError::Io(std::io::Error::other("disk"));
        assert_eq!(ExitCode::from(&io), ExitCode::from(1));
    }
}
