//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod json_report_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod summary_table;

use crate::ports::report_port::ReportPort;
use std::path::Path;

/// `.json` selects JSON output; any other extension writes CSV.
pub fn report_for_path(path: &str) -> Box<dyn ReportPort> {
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Box::new(json_report_adapter::JsonReportAdapter)
    } else {
        Box::new(csv_report_adapter::CsvReportAdapter)
    }
}
