//! Core domain types and logic.

pub mod instrument;
pub mod trade;
pub mod scale;
pub mod breakeven;
pub mod calc;
pub mod config_validation;
pub mod error;
