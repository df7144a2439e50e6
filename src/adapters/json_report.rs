//! JSON report adapter implementing ReportPort.
//!
//! Undefined figures serialise as `null`.

use std::io::Write;

use crate::domain::calc::CalcReport;
use crate::domain::error::RiskCalcError;
use crate::ports::report_port::ReportPort;

pub struct JsonReport {
    pub pretty: bool,
}

impl ReportPort for JsonReport {
    fn write(&self, report: &CalcReport, out: &mut dyn Write) -> Result<(), RiskCalcError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, report)?;
        } else {
            serde_json::to_writer(&mut *out, report)?;
        }
        writeln!(out)?;
        Ok(())
    }
}
