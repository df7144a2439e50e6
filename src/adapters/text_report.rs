//! Plain-text report adapter implementing ReportPort.

use std::io::Write;

use crate::domain::calc::{CalcReport, Figure};
use crate::domain::error::RiskCalcError;
use crate::domain::scale::ScaleTable;
use crate::ports::report_port::ReportPort;

pub struct TextReport;

const NOT_APPLICABLE: &str = "n/a";

fn figure(value: Figure, render: impl Fn(f64) -> String) -> String {
    match value {
        Figure::Value(v) => render(v),
        Figure::NotApplicable => NOT_APPLICABLE.to_string(),
    }
}

fn with_pct(amount: Figure, pct: Figure) -> String {
    match pct {
        Figure::Value(p) => format!("{} ({:.3}%)", figure(amount, |v| format!("{v:.2}")), p),
        Figure::NotApplicable => figure(amount, |v| format!("{v:.2}")),
    }
}

fn format_contracts(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

pub fn format_scale_table(report: &CalcReport, table: &ScaleTable) -> Vec<String> {
    let inst = &report.instrument;
    let mut lines = vec![format!(
        "{:>4}  {:>12}  {:>6}  {:>14}",
        "R", "Price", "Ticks", "Exact"
    )];
    for row in &table.rows {
        lines.push(format!(
            "{:>4}  {:>12}  {:>6}  {:>14}",
            row.r,
            inst.format_price(row.rounded),
            format!("{:.0}", row.ticks_from_zero),
            inst.format_exact(row.exact),
        ));
    }
    lines
}

impl ReportPort for TextReport {
    fn write(&self, report: &CalcReport, out: &mut dyn Write) -> Result<(), RiskCalcError> {
        let inst = &report.instrument;

        writeln!(
            out,
            "Instrument:       tick {} = ${:.2}",
            inst.format_price(inst.tick_size()),
            inst.tick_value()
        )?;
        writeln!(out, "Direction:        {} ({:?})", report.direction, report.mode)?;
        match report.trade_risk_pct {
            Some(pct) => writeln!(out, "Max Risk:         {:.2} ({:.3}%)", report.max_risk, pct)?,
            None => writeln!(out, "Max Risk:         {:.2}", report.max_risk)?,
        }
        writeln!(
            out,
            "Avg Entry:        {}",
            figure(report.avg_entry, |v| inst.format_exact(v))
        )?;
        writeln!(
            out,
            "Worst Exit:       {}",
            figure(report.worst_exit, |v| inst.format_exact(v))
        )?;
        writeln!(
            out,
            "Contracts:        {} ({} open)",
            format_contracts(report.num_contracts),
            format_contracts(report.remaining_open_contracts)
        )?;
        writeln!(
            out,
            "Entry/Exit Risk:  {}",
            with_pct(report.displayed_risk, report.displayed_risk_pct)
        )?;
        writeln!(
            out,
            "Worst R:          {}",
            figure(report.worst_r, |v| format!("{v:.2}"))
        )?;
        if let Some(be) = report.breakeven_entry {
            writeln!(
                out,
                "Break-even Entry: {}",
                figure(be, |v| inst.format_exact(v))
            )?;
        }

        if let Some(table) = &report.scale {
            writeln!(out)?;
            for line in format_scale_table(report, table) {
                writeln!(out, "{line}")?;
            }
        }

        if !report.notes.is_empty() {
            writeln!(out, "\nNotes:")?;
            for note in &report.notes {
                writeln!(out, "  - {note}")?;
            }
        }
        Ok(())
    }
}
