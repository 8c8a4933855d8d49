//! Rendering port for scan results.

use crate::domain::error::ScreenerError;
use crate::domain::scan::ScanReport;

/// Port for publishing a finished scan.
pub trait ReportPort {
    fn write(&self, report: &ScanReport) -> Result<(), ScreenerError>;
}
