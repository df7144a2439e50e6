//! Fill accumulation and derived trade statistics.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::error::RiskCalcError;
use crate::domain::instrument::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl FromStr for Direction {
    type Err = RiskCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "1" | "+1" => Ok(Direction::Long),
            "short" | "-1" => Ok(Direction::Short),
            other => Err(RiskCalcError::invalid(
                "direction",
                format!("expected long, short, 1 or -1, got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// How derived ratios treat a zero denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DivisionMode {
    /// Zero denominators are reported as [`RiskCalcError::UndefinedResult`].
    #[default]
    Strict,
    /// Zero denominators produce raw NaN or infinity.
    Legacy,
}

impl DivisionMode {
    pub(crate) fn divide(
        self,
        numerator: f64,
        denominator: f64,
        field: &str,
        reason: &str,
    ) -> Result<f64, RiskCalcError> {
        if self == DivisionMode::Strict && denominator == 0.0 {
            return Err(RiskCalcError::undefined(field, reason));
        }
        Ok(numerator / denominator)
    }
}

impl FromStr for DivisionMode {
    type Err = RiskCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(DivisionMode::Strict),
            "legacy" => Ok(DivisionMode::Legacy),
            other => Err(RiskCalcError::invalid(
                "mode",
                format!("expected strict or legacy, got {other:?}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillKind {
    None,
    Entry,
    Stop,
    Exit,
}

impl FromStr for FillKind {
    type Err = RiskCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(FillKind::None),
            "entry" => Ok(FillKind::Entry),
            "stop" => Ok(FillKind::Stop),
            "exit" => Ok(FillKind::Exit),
            other => Err(RiskCalcError::invalid(
                "kind",
                format!("expected entry, stop, exit or none, got {other:?}"),
            )),
        }
    }
}

/// One recorded price and quantity. A missing quantity counts as one contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub kind: FillKind,
    pub price: f64,
    pub contracts: Option<f64>,
}

impl Fill {
    pub fn new(kind: FillKind, price: f64, contracts: f64) -> Self {
        Self {
            kind,
            price,
            contracts: Some(contracts),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Tally {
    sum: f64,
    contracts: f64,
}

impl Tally {
    fn add(&mut self, price: f64, contracts: f64) {
        self.sum += price * contracts;
        self.contracts += contracts;
    }
}

/// Running totals for one directional position.
///
/// Rebuilt from the full list of fills on every pass; nothing is ever
/// subtracted.
#[derive(Debug, Clone)]
pub struct Trade {
    instrument: Instrument,
    direction: Direction,
    mode: DivisionMode,
    entry: Tally,
    exit: Tally,
    stop: Tally,
}

impl Trade {
    pub fn new(instrument: Instrument, direction: Direction) -> Self {
        Self::with_mode(instrument, direction, DivisionMode::Strict)
    }

    pub fn with_mode(instrument: Instrument, direction: Direction, mode: DivisionMode) -> Self {
        Self {
            instrument,
            direction,
            mode,
            entry: Tally::default(),
            exit: Tally::default(),
            stop: Tally::default(),
        }
    }

    /// Builds a trade from raw fills, skipping rows without a usable price.
    /// A zero or missing contract count is taken as a single contract.
    pub fn from_fills(
        instrument: Instrument,
        direction: Direction,
        mode: DivisionMode,
        fills: &[Fill],
    ) -> Self {
        let mut trade = Self::with_mode(instrument, direction, mode);
        for fill in fills {
            if !fill.price.is_finite() || fill.price <= 0.0 {
                continue;
            }
            // whole contracts only; a count that truncates to zero means one
            let contracts = match fill.contracts.map(f64::trunc) {
                Some(c) if c.is_finite() && c != 0.0 => c,
                _ => 1.0,
            };
            trade.record(&Fill {
                contracts: Some(contracts),
                ..*fill
            });
        }
        trade
    }

    pub fn record(&mut self, fill: &Fill) {
        let contracts = fill.contracts.unwrap_or(1.0);
        match fill.kind {
            FillKind::Entry => self.add_entry(fill.price, contracts),
            FillKind::Exit => self.add_exit(fill.price, contracts),
            FillKind::Stop => self.add_stop(fill.price, contracts),
            FillKind::None => {}
        }
    }

    pub fn add_entry(&mut self, price: f64, contracts: f64) {
        self.entry.add(price, contracts);
    }

    pub fn add_exit(&mut self, price: f64, contracts: f64) {
        self.exit.add(price, contracts);
    }

    pub fn add_stop(&mut self, price: f64, contracts: f64) {
        self.stop.add(price, contracts);
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode(&self) -> DivisionMode {
        self.mode
    }

    pub fn is_empty(&self) -> bool {
        self.entry == Tally::default() && self.exit == Tally::default() && self.stop == Tally::default()
    }

    pub fn entry_sum(&self) -> f64 {
        self.entry.sum
    }

    pub fn entry_contracts(&self) -> f64 {
        self.entry.contracts
    }

    pub fn exit_sum(&self) -> f64 {
        self.exit.sum
    }

    pub fn exit_contracts(&self) -> f64 {
        self.exit.contracts
    }

    pub fn stop_sum(&self) -> f64 {
        self.stop.sum
    }

    pub fn stop_contracts(&self) -> f64 {
        self.stop.contracts
    }

    /// Entry value still carried by the open contracts.
    pub fn open_cost(&self) -> f64 {
        self.entry.sum - self.exit.sum
    }

    pub fn avg_entry(&self) -> Result<f64, RiskCalcError> {
        self.mode.divide(
            self.entry.sum,
            self.entry.contracts,
            "avg_entry",
            "no entry contracts recorded",
        )
    }

    /// Average of all exits and stops: the price assuming every stop is hit.
    pub fn worst_exit(&self) -> Result<f64, RiskCalcError> {
        self.mode.divide(
            self.exit.sum + self.stop.sum,
            self.exit.contracts + self.stop.contracts,
            "worst_exit",
            "no exit or stop contracts recorded",
        )
    }

    pub fn num_contracts(&self) -> f64 {
        self.entry
            .contracts
            .max(self.exit.contracts + self.stop.contracts)
    }

    pub fn remaining_open_contracts(&self) -> f64 {
        self.entry.contracts - self.exit.contracts
    }

    /// Signed dollars between the average entry and the worst exit.
    /// Positive means the worst case loses money.
    pub fn entry_exit_risk(&self) -> Result<f64, RiskCalcError> {
        let avg_entry = self.avg_entry()?;
        let worst_exit = self.worst_exit()?;
        Ok(self.direction.sign()
            * self.num_contracts()
            * self.instrument.money_diff(avg_entry, worst_exit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn es() -> Instrument {
        Instrument::new(0.25, 12.50).unwrap()
    }

    fn cl() -> Instrument {
        Instrument::new(0.01, 10.00).unwrap()
    }

    #[test]
    fn long_trade_with_exit_and_stop() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 2.0);
        trade.add_exit(101.0, 1.0);
        trade.add_stop(99.0, 1.0);

        assert_relative_eq!(trade.avg_entry().unwrap(), 100.0);
        assert_relative_eq!(trade.worst_exit().unwrap(), 100.0);
        assert_relative_eq!(trade.num_contracts(), 2.0);
        assert_relative_eq!(trade.entry_exit_risk().unwrap(), 0.0);
        assert_relative_eq!(trade.remaining_open_contracts(), 1.0);
    }

    #[test]
    fn short_trade_fully_exited() {
        let mut trade = Trade::new(cl(), Direction::Short);
        trade.add_entry(50.0, 3.0);
        trade.add_exit(49.5, 3.0);

        assert_relative_eq!(trade.entry_exit_risk().unwrap(), -1500.0, epsilon = 1e-6);
        assert_relative_eq!(trade.remaining_open_contracts(), 0.0);
    }

    #[test]
    fn long_trade_stopped_below_entry_is_positive_risk() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 1.0);
        trade.add_stop(98.0, 1.0);
        assert_relative_eq!(trade.entry_exit_risk().unwrap(), 100.0);
    }

    #[test]
    fn num_contracts_takes_larger_side() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 1.0);
        trade.add_stop(99.0, 3.0);
        assert_relative_eq!(trade.num_contracts(), 3.0);
    }

    #[test]
    fn empty_trade_is_undefined_in_strict_mode() {
        let trade = Trade::new(es(), Direction::Long);
        assert!(trade.is_empty());
        let err = trade.avg_entry().unwrap_err();
        assert!(
            matches!(err, RiskCalcError::UndefinedResult { ref field, .. } if field == "avg_entry")
        );
        assert!(trade.worst_exit().is_err());
        assert!(trade.entry_exit_risk().is_err());
    }

    #[test]
    fn worst_exit_undefined_without_exits() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 1.0);
        let err = trade.entry_exit_risk().unwrap_err();
        assert!(
            matches!(err, RiskCalcError::UndefinedResult { ref field, .. } if field == "worst_exit")
        );
    }

    #[test]
    fn empty_trade_is_nan_in_legacy_mode() {
        let trade = Trade::with_mode(es(), Direction::Long, DivisionMode::Legacy);
        assert!(trade.avg_entry().unwrap().is_nan());
        assert!(trade.worst_exit().unwrap().is_nan());
        assert!(trade.entry_exit_risk().unwrap().is_nan());
    }

    #[test]
    fn legacy_mode_divides_by_zero_contracts() {
        let mut trade = Trade::with_mode(es(), Direction::Long, DivisionMode::Legacy);
        trade.add_entry(100.0, 1.0);
        trade.add_entry(101.0, -1.0);
        assert!(trade.avg_entry().unwrap().is_infinite());
    }

    #[test]
    fn accumulation_order_does_not_matter() {
        let mut a = Trade::new(es(), Direction::Long);
        a.add_entry(100.25, 2.0);
        a.add_entry(101.5, 1.0);
        let mut b = Trade::new(es(), Direction::Long);
        b.add_entry(101.5, 1.0);
        b.add_entry(100.25, 2.0);
        assert_relative_eq!(a.entry_sum(), b.entry_sum());
        assert_relative_eq!(a.entry_contracts(), b.entry_contracts());
    }

    #[test]
    fn negative_contracts_are_accepted() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 3.0);
        trade.add_entry(100.0, -1.0);
        assert_relative_eq!(trade.entry_contracts(), 2.0);
    }

    #[test]
    fn from_fills_skips_unpriced_rows() {
        let fills = [
            Fill::new(FillKind::Entry, 100.0, 2.0),
            Fill::new(FillKind::Exit, 0.0, 5.0),
            Fill::new(FillKind::Stop, -3.0, 1.0),
            Fill::new(FillKind::Stop, f64::NAN, 1.0),
        ];
        let trade = Trade::from_fills(es(), Direction::Long, DivisionMode::Strict, &fills);
        assert_relative_eq!(trade.entry_contracts(), 2.0);
        assert_eq!(trade.exit_contracts(), 0.0);
        assert_eq!(trade.stop_contracts(), 0.0);
    }

    #[test]
    fn from_fills_defaults_contracts_to_one() {
        let fills = [
            Fill {
                kind: FillKind::Entry,
                price: 100.0,
                contracts: None,
            },
            Fill::new(FillKind::Stop, 99.0, 0.0),
        ];
        let trade = Trade::from_fills(es(), Direction::Long, DivisionMode::Strict, &fills);
        assert_relative_eq!(trade.entry_contracts(), 1.0);
        assert_relative_eq!(trade.stop_contracts(), 1.0);
    }

    #[test]
    fn from_fills_truncates_fractional_contracts() {
        let fills = [
            Fill::new(FillKind::Entry, 100.0, 2.7),
            Fill::new(FillKind::Exit, 101.0, 0.5),
            Fill::new(FillKind::Stop, 99.0, -1.9),
        ];
        let trade = Trade::from_fills(es(), Direction::Long, DivisionMode::Strict, &fills);
        assert_eq!(trade.entry_contracts(), 2.0);
        assert_eq!(trade.exit_contracts(), 1.0);
        assert_eq!(trade.stop_contracts(), -1.0);
        assert_relative_eq!(trade.entry_sum(), 200.0);
    }

    #[test]
    fn none_fills_are_ignored() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.record(&Fill::new(FillKind::None, 100.0, 1.0));
        assert!(trade.is_empty());
    }

    #[test]
    fn open_cost_subtracts_exits() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 3.0);
        trade.add_exit(102.0, 1.0);
        assert_relative_eq!(trade.open_cost(), 198.0);
    }

    #[test]
    fn direction_parses() {
        assert_eq!("long".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!(" Short ".parse::<Direction>().unwrap(), Direction::Short);
        assert_eq!("1".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("-1".parse::<Direction>().unwrap(), Direction::Short);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn fill_kind_parses() {
        assert_eq!("Entry".parse::<FillKind>().unwrap(), FillKind::Entry);
        assert_eq!("STOP".parse::<FillKind>().unwrap(), FillKind::Stop);
        assert_eq!("".parse::<FillKind>().unwrap(), FillKind::None);
        assert!("target".parse::<FillKind>().is_err());
    }

    #[test]
    fn mode_parses() {
        assert_eq!("legacy".parse::<DivisionMode>().unwrap(), DivisionMode::Legacy);
        assert_eq!("Strict".parse::<DivisionMode>().unwrap(), DivisionMode::Strict);
        assert!("loose".parse::<DivisionMode>().is_err());
    }
}
