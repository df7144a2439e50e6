//! One full recompute pass: inputs in, report out.
//!
//! [`recalc`] builds a fresh [`Instrument`] and [`Trade`] from a
//! [`CalcInput`] and derives every figure shown to the user. Invalid
//! instrument parameters fail the whole pass; a figure whose denominator is
//! zero is reported as [`Figure::NotApplicable`] with the reason kept in
//! [`CalcReport::notes`].

use serde::Serialize;

use crate::domain::breakeven::breakeven_entry;
use crate::domain::error::RiskCalcError;
use crate::domain::instrument::Instrument;
use crate::domain::scale::{DEFAULT_SCALE_ROWS, ScaleTable, checked_rows};
use crate::domain::trade::{Direction, DivisionMode, Fill, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct BreakevenInput {
    pub target: f64,
    pub contracts: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalcInput {
    pub tick_size: f64,
    pub tick_value: f64,
    pub direction: Direction,
    pub account_size: f64,
    pub max_risk: f64,
    pub mode: DivisionMode,
    pub scale_rows: usize,
    pub breakeven: Option<BreakevenInput>,
    pub fills: Vec<Fill>,
}

impl CalcInput {
    pub fn new(instrument: &Instrument, direction: Direction) -> Self {
        Self {
            tick_size: instrument.tick_size(),
            tick_value: instrument.tick_value(),
            direction,
            account_size: 0.0,
            max_risk: 0.0,
            mode: DivisionMode::Strict,
            scale_rows: DEFAULT_SCALE_ROWS,
            breakeven: None,
            fills: Vec::new(),
        }
    }
}

/// A derived number, or a marker that it cannot be computed from the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Figure {
    Value(f64),
    NotApplicable,
}

impl Figure {
    pub fn value(self) -> Option<f64> {
        match self {
            Figure::Value(v) => Some(v),
            Figure::NotApplicable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalcReport {
    pub instrument: Instrument,
    pub direction: Direction,
    pub mode: DivisionMode,
    pub account_size: f64,
    pub max_risk: f64,
    /// Accepted risk as a percentage of the account; only when the account is sized.
    pub trade_risk_pct: Option<f64>,
    pub avg_entry: Figure,
    pub worst_exit: Figure,
    pub num_contracts: f64,
    pub remaining_open_contracts: f64,
    pub entry_exit_risk: Figure,
    /// Worst-case loss: entry-exit risk floored at zero.
    pub displayed_risk: Figure,
    pub displayed_risk_pct: Figure,
    pub worst_r: Figure,
    pub scale: Option<ScaleTable>,
    pub breakeven_entry: Option<Figure>,
    pub notes: Vec<String>,
}

pub fn recalc(input: &CalcInput) -> Result<CalcReport, RiskCalcError> {
    let instrument = Instrument::new(input.tick_size, input.tick_value)?;
    checked_rows(input.scale_rows)?;

    let trade = Trade::from_fills(instrument, input.direction, input.mode, &input.fills);
    tracing::debug!(
        direction = %input.direction,
        mode = ?input.mode,
        entry_contracts = trade.entry_contracts(),
        exit_contracts = trade.exit_contracts(),
        stop_contracts = trade.stop_contracts(),
        "trade rebuilt from fills"
    );

    let mut notes = Vec::new();
    let mode = input.mode;

    let trade_risk_pct =
        (input.account_size > 0.0).then(|| input.max_risk / input.account_size * 100.0);

    let avg_entry = settle(trade.avg_entry(), &mut notes);
    let worst_exit = settle(trade.worst_exit(), &mut notes);

    let eer = trade.entry_exit_risk();
    let entry_exit_risk = match &eer {
        Ok(v) => Figure::Value(*v),
        Err(_) => Figure::NotApplicable,
    };

    let (displayed_risk, displayed_risk_pct, worst_r) = match eer {
        Ok(risk) => {
            let shown = if risk.is_nan() { risk } else { risk.max(0.0) };
            // an unsized account means no percentages, not an undefined one
            let pct = if input.account_size > 0.0 {
                Figure::Value(shown * 100.0 / input.account_size)
            } else {
                Figure::NotApplicable
            };
            let worst_r = settle(
                mode.divide(-risk, input.max_risk, "worst_r", "max risk is zero"),
                &mut notes,
            );
            (Figure::Value(shown), pct, worst_r)
        }
        // avg_entry or worst_exit has already recorded why
        Err(_) => (
            Figure::NotApplicable,
            Figure::NotApplicable,
            Figure::NotApplicable,
        ),
    };

    let scale = match ScaleTable::build(&trade, input.max_risk, input.scale_rows) {
        Ok(table) => Some(table),
        Err(e) => {
            notes.push(e.to_string());
            None
        }
    };

    let breakeven_entry = input
        .breakeven
        .as_ref()
        .map(|be| settle(breakeven_entry(&trade, be.target, be.contracts), &mut notes));

    for note in &notes {
        tracing::warn!(%note, "figure not applicable");
    }

    Ok(CalcReport {
        instrument,
        direction: input.direction,
        mode,
        account_size: input.account_size,
        max_risk: input.max_risk,
        trade_risk_pct,
        avg_entry,
        worst_exit,
        num_contracts: trade.num_contracts(),
        remaining_open_contracts: trade.remaining_open_contracts(),
        entry_exit_risk,
        displayed_risk,
        displayed_risk_pct,
        worst_r,
        scale,
        breakeven_entry,
        notes,
    })
}

/// Adopts the current worst-case loss, rounded to cents, as the accepted
/// risk for the next pass.
pub fn accept_risk(input: &CalcInput) -> Result<CalcInput, RiskCalcError> {
    let report = recalc(input)?;
    let risk = report
        .displayed_risk
        .value()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RiskCalcError::undefined("max_risk", "no entry-exit risk to accept"))?;

    let accepted = (risk * 100.0).round() / 100.0;
    tracing::info!(previous = input.max_risk, accepted, "accepted entry-exit risk");

    Ok(CalcInput {
        max_risk: accepted,
        ..input.clone()
    })
}

fn settle(result: Result<f64, RiskCalcError>, notes: &mut Vec<String>) -> Figure {
    match result {
        Ok(v) => Figure::Value(v),
        Err(e) => {
            notes.push(e.to_string());
            Figure::NotApplicable
        }
    }
}
