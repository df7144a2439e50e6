//! Tick-size-aware instrument model.
//!
//! An [`Instrument`] knows its minimum price increment and the dollar value
//! of one increment. It converts price deltas to money and snaps prices onto
//! its tick grid.

use serde::Serialize;

use crate::domain::error::RiskCalcError;

/// Fractional remainder below which a scaled tick size counts as integral.
const DIGITS_TOLERANCE: f64 = 0.000001;

/// Divisor applied to the tick size to get the directional-rounding threshold.
const ROUND_THRESHOLD_DIVISOR: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Instrument {
    tick_size: f64,
    tick_value: f64,
    tick_size_digits: u32,
}

impl Instrument {
    pub fn new(tick_size: f64, tick_value: f64) -> Result<Self, RiskCalcError> {
        check_positive("tick_size", tick_size)?;
        check_positive("tick_value", tick_value)?;

        let mut digits = 0;
        let mut tmp = tick_size;
        while tmp - tmp.trunc() > DIGITS_TOLERANCE {
            tmp *= 10.0;
            digits += 1;
        }

        Ok(Self {
            tick_size,
            tick_value,
            tick_size_digits: digits,
        })
    }

    /// Looks up a known instrument by name, ignoring case.
    pub fn preset(name: &str) -> Result<Self, RiskCalcError> {
        known_instruments()
            .into_iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
            .map(|(_, inst)| inst)
            .ok_or_else(|| RiskCalcError::UnknownInstrument {
                name: name.to_string(),
            })
    }

    pub fn tick_size(&self) -> f64 {
        self.tick_size
    }

    pub fn tick_value(&self) -> f64 {
        self.tick_value
    }

    pub fn tick_size_digits(&self) -> u32 {
        self.tick_size_digits
    }

    /// Dollar value of moving one contract from `to` to `from`.
    pub fn money_diff(&self, from: f64, to: f64) -> f64 {
        (from - to) / self.tick_size * self.tick_value
    }

    /// Snaps `price` onto the tick grid.
    ///
    /// Ordinary half-up rounding applies unless the scaled price sits more
    /// than `tick_size / 16` away from the nearest whole tick, in which case
    /// the price is pushed up for a positive `direction_hint` and down
    /// otherwise. The threshold mixes a tick count with a tick size; that
    /// mismatch is kept so results match existing worksheets.
    pub fn round(&self, price: f64, direction_hint: f64) -> f64 {
        let scaled = price / self.tick_size;
        let mut ticks = round_half_up(scaled);
        if (scaled - ticks).abs() > self.tick_size / ROUND_THRESHOLD_DIVISOR {
            ticks = if direction_hint > 0.0 {
                scaled.ceil()
            } else {
                scaled.floor()
            };
        }
        ticks * self.tick_size
    }

    /// Whole ticks between two prices, half-up rounded.
    pub fn ticks_between(&self, from: f64, to: f64) -> f64 {
        round_half_up((from - to) / self.tick_size)
    }

    pub fn format_price(&self, price: f64) -> String {
        format!("{:.*}", self.tick_size_digits as usize, price)
    }

    pub fn format_exact(&self, price: f64) -> String {
        format!("{:.*}", self.tick_size_digits as usize + 2, price)
    }
}

/// The built-in instrument presets, in display order.
pub fn known_instruments() -> Vec<(&'static str, Instrument)> {
    vec![
        ("ES", builtin(0.25, 12.50, 2)),
        ("E6", builtin(5.0, 6.25, 0)),
        ("CL", builtin(0.01, 10.00, 2)),
        ("Stocks", builtin(0.01, 0.01, 2)),
    ]
}

fn builtin(tick_size: f64, tick_value: f64, tick_size_digits: u32) -> Instrument {
    Instrument {
        tick_size,
        tick_value,
        tick_size_digits,
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), RiskCalcError> {
    if !value.is_finite() {
        return Err(RiskCalcError::invalid(name, "must be finite"));
    }
    if value <= 0.0 {
        return Err(RiskCalcError::invalid(name, "must be positive"));
    }
    Ok(())
}

/// Rounds ties toward positive infinity.
pub(crate) fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
