//! Screening result output port.

use crate::domain::error::ScreenerError;
use crate::domain::screen::ScreeningRecord;

pub trait ReportPort {
    fn write(&self, records: &[ScreeningRecord], output_path: &str) -> Result<(), ScreenerError>;
}
