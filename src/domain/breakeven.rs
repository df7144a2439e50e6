//! Break-even adjustment.

use crate::domain::error::RiskCalcError;
use crate::domain::trade::Trade;

/// Price at which adding `contracts` more contracts moves the blended cost
/// of the open position to `target`.
pub fn breakeven_entry(trade: &Trade, target: f64, contracts: f64) -> Result<f64, RiskCalcError> {
    trade.mode().divide(
        target * (trade.remaining_open_contracts() + contracts) - trade.open_cost(),
        contracts,
        "breakeven_entry",
        "break-even contract count is zero",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::Instrument;
    use crate::domain::trade::{Direction, DivisionMode};
    use approx::assert_relative_eq;

    fn es() -> Instrument {
        Instrument::new(0.25, 12.50).unwrap()
    }

    #[test]
    fn averaging_down_to_target() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(102.0, 1.0);
        // one more contract at 98 brings the average to 100
        assert_relative_eq!(breakeven_entry(&trade, 100.0, 1.0).unwrap(), 98.0);
    }

    #[test]
    fn accounts_for_partial_exits() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 3.0);
        trade.add_exit(104.0, 1.0);
        // open cost 196 over 2 contracts; target 97 with 2 more contracts
        assert_relative_eq!(breakeven_entry(&trade, 97.0, 2.0).unwrap(), 96.0);
    }

    #[test]
    fn zero_contracts_is_undefined() {
        let mut trade = Trade::new(es(), Direction::Long);
        trade.add_entry(100.0, 1.0);
        let err = breakeven_entry(&trade, 99.0, 0.0).unwrap_err();
        assert!(
            matches!(err, RiskCalcError::UndefinedResult { ref field, .. } if field == "breakeven_entry")
        );
    }

    #[test]
    fn zero_contracts_legacy_is_infinite() {
        let mut trade = Trade::with_mode(es(), Direction::Long, DivisionMode::Legacy);
        trade.add_entry(100.0, 1.0);
        assert!(breakeven_entry(&trade, 99.0, 0.0).unwrap().is_infinite());
    }
}
