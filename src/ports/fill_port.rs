//! Fill source port trait.

use crate::domain::error::RiskCalcError;
use crate::domain::trade::Fill;

pub trait FillPort {
    /// Every recorded fill, in recorded order. Order does not affect results.
    fn load_fills(&self) -> Result<Vec<Fill>, RiskCalcError>;
}
