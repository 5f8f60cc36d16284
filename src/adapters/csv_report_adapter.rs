//! CSV result writer.
//!
//! Records flatten to different field sets depending on where they stopped,
//! so the header is the union of every record's fields in first-seen order.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreeningRecord;
use crate::ports::report_port::ReportPort;
use indexmap::IndexSet;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn render(&self, records: &[ScreeningRecord]) -> Result<Vec<u8>, csv::Error> {
        let rows: Vec<_> = records.iter().map(ScreeningRecord::to_row).collect();

        let mut header: IndexSet<&str> = IndexSet::new();
        for row in &rows {
            header.extend(row.keys().map(String::as_str));
        }
        if header.is_empty() {
            return Ok(Vec::new());
        }

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(header.iter())?;
        for row in &rows {
            let cells = header
                .iter()
                .map(|key| row.get(*key).map(|v| v.to_string()).unwrap_or_default());
            wtr.write_record(cells)?;
        }
        wtr.into_inner().map_err(|e| e.into_error().into())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, records: &[ScreeningRecord], output_path: &str) -> Result<(), ScreenerError> {
        let report_error = |reason: String| ScreenerError::Report {
            path: output_path.to_string(),
            reason,
        };
        let bytes = self.render(records).map_err(|e| report_error(e.to_string()))?;
        std::fs::write(output_path, bytes).map_err(|e| report_error(e.to_string()))
    }
}
