//! R-multiple scale table.
//!
//! For each R-multiple the table gives the price at which closing the open
//! contracts would realise that many multiples of the accepted risk, both
//! exact and snapped to the tick grid.

use serde::Serialize;

use crate::domain::error::RiskCalcError;
use crate::domain::instrument::Instrument;
use crate::domain::trade::{Direction, Trade};

pub const DEFAULT_SCALE_ROWS: usize = 8;

/// Largest table that will be built.
pub const MAX_SCALE_ROWS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleRow {
    pub r: i32,
    pub rounded: f64,
    pub ticks_from_zero: f64,
    pub exact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleTable {
    pub zero_price: f64,
    pub risk_term: f64,
    pub rows: Vec<ScaleRow>,
}

/// Price offset, summed over all open contracts, worth one R.
pub fn risk_term(direction: Direction, instrument: &Instrument, max_risk: f64) -> f64 {
    direction.sign() * instrument.tick_size() * max_risk / instrument.tick_value()
}

/// Unrounded exit price for the open contracts that realises `r` multiples.
pub fn exact_price(trade: &Trade, risk_term: f64, r: i32) -> Result<f64, RiskCalcError> {
    trade.mode().divide(
        trade.open_cost() + risk_term * f64::from(r),
        trade.remaining_open_contracts(),
        "scale",
        "no open contracts remain",
    )
}

/// Checks a requested row count against `1 ..= MAX_SCALE_ROWS`.
pub fn checked_rows(rows: usize) -> Result<i32, RiskCalcError> {
    if rows == 0 || rows > MAX_SCALE_ROWS {
        return Err(RiskCalcError::invalid(
            "scale_rows",
            format!("must be between 1 and {MAX_SCALE_ROWS}, got {rows}"),
        ));
    }
    i32::try_from(rows).map_err(|_| RiskCalcError::invalid("scale_rows", "out of range"))
}

/// R-values shown for a table of `rows` rows, top row first.
///
/// Rows span `-1 ..= rows - 2`. Longs list the highest R first and shorts the
/// lowest, so prices always descend down the table.
pub fn r_values(direction: Direction, rows: usize) -> Result<Vec<i32>, RiskCalcError> {
    let top = checked_rows(rows)? - 2;
    Ok(match direction {
        Direction::Long => (-1..=top).rev().collect(),
        Direction::Short => (-1..=top).collect(),
    })
}

impl ScaleTable {
    pub fn build(trade: &Trade, max_risk: f64, rows: usize) -> Result<Self, RiskCalcError> {
        let rs = r_values(trade.direction(), rows)?;
        let instrument = trade.instrument();
        let sign = trade.direction().sign();
        let risk_term = risk_term(trade.direction(), instrument, max_risk);
        let zero_price = instrument.round(exact_price(trade, risk_term, 0)?, sign);

        let rows = rs
            .into_iter()
            .map(|r| {
                let exact = exact_price(trade, risk_term, r)?;
                let rounded = instrument.round(exact, sign);
                Ok(ScaleRow {
                    r,
                    rounded,
                    ticks_from_zero: instrument.ticks_between(rounded, zero_price),
                    exact,
                })
            })
            .collect::<Result<Vec<_>, RiskCalcError>>()?;

        Ok(Self {
            zero_price,
            risk_term,
            rows,
        })
    }

    pub fn row(&self, r: i32) -> Option<&ScaleRow> {
        self.rows.iter().find(|row| row.r == r)
    }
}
