//! Report rendering port trait.

use std::io::Write;

use crate::domain::calc::CalcReport;
use crate::domain::error::RiskCalcError;

/// Port for rendering a computed report.
pub trait ReportPort {
    fn write(&self, report: &CalcReport, out: &mut dyn Write) -> Result<(), RiskCalcError>;

    /// Default implementation: renders into an in-memory buffer.
    fn render(&self, report: &CalcReport) -> Result<String, RiskCalcError> {
        let mut buf = Vec::new();
        self.write(report, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
