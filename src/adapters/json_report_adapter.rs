//! JSON result writer: a pretty-printed array of flattened records.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreeningRecord;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn render(&self, records: &[ScreeningRecord]) -> serde_json::Result<String> {
        let rows: Vec<_> = records.iter().map(ScreeningRecord::to_row).collect();
        serde_json::to_string_pretty(&rows)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, records: &[ScreeningRecord], output_path: &str) -> Result<(), ScreenerError> {
        let report_error = |reason: String| ScreenerError::Report {
            path: output_path.to_string(),
            reason,
        };
        let json = self.render(records).map_err(|e| report_error(e.to_string()))?;
        std::fs::write(output_path, json).map_err(|e| report_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::MacdValue;
    use crate::domain::rule_eval::check_market_cap;
    use crate::domain::screen::{Outcome, RejectedAt, Stage, StageVerdict};
    use serde_json::Value;

    #[test]
    fn missing_values_become_null() {
        let record = ScreeningRecord {
            code: "000001".to_string(),
            name: "平安银行".to_string(),
            outcome: Outcome::Rejected(RejectedAt::Stage(Stage::Valuation)),
            verdicts: vec![StageVerdict {
                stage: Stage::Valuation,
                verdict: check_market_cap(None, 1000.0),
            }],
            daily: None,
        };

        let json = JsonReportAdapter.render(&[record]).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed[0]["name"], "平安银行");
        assert_eq!(parsed[0]["reason"], "market cap unavailable");
        assert_eq!(parsed[0]["mv_pass"], false);
        assert!(parsed[0]["mv_market_cap"].is_null());
        assert_eq!(parsed[0]["mv_max_market_cap"], 1000.0);
    }

    #[test]
    fn keeps_field_order() {
        let record = ScreeningRecord {
            code: "600000".to_string(),
            name: "浦发银行".to_string(),
            outcome: Outcome::Passed,
            verdicts: vec![],
            daily: Some(MacdValue {
                dif: 0.3,
                dea: 0.2,
                hist: 0.2,
            }),
        };

        let json = JsonReportAdapter.render(&[record]).unwrap();
        let code = json.find("\"code\"").unwrap();
        let status = json.find("\"status\"").unwrap();
        let daily = json.find("\"daily_hist\"").unwrap();
        assert!(code < status && status < daily);
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        JsonReportAdapter.write(&[], path.to_str().unwrap()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }
}
