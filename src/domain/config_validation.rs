//! Configuration validation.
//!
//! Checks every calculator field before a pass runs, so a bad config is
//! reported by section and key instead of surfacing as a NaN.

use crate::domain::error::RiskCalcError;
use crate::domain::instrument::Instrument;
use crate::domain::scale::MAX_SCALE_ROWS;
use crate::domain::trade::{Direction, DivisionMode};
use crate::ports::config_port::ConfigPort;

pub fn validate_calc_config(config: &dyn ConfigPort) -> Result<(), RiskCalcError> {
    validate_instrument(config)?;
    validate_account(config)?;
    validate_trade(config)?;
    validate_scale(config)?;
    validate_breakeven(config)?;
    Ok(())
}

/// Reads an optional numeric key, rejecting values that do not parse.
pub fn parse_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, RiskCalcError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("{s:?} is not a number"))),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> RiskCalcError {
    RiskCalcError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> RiskCalcError {
    RiskCalcError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Resolves tick size and value: explicit keys override a preset.
pub fn resolve_instrument(config: &dyn ConfigPort) -> Result<Instrument, RiskCalcError> {
    let preset = match config
        .get_string("instrument", "preset")
        .filter(|s| !s.trim().is_empty())
    {
        Some(name) => Some(Instrument::preset(&name)?),
        None => None,
    };

    let tick_size = match (parse_double(config, "instrument", "tick_size")?, preset) {
        (Some(v), _) => v,
        (None, Some(p)) => p.tick_size(),
        (None, None) => return Err(missing("instrument", "tick_size")),
    };
    let tick_value = match (parse_double(config, "instrument", "tick_value")?, preset) {
        (Some(v), _) => v,
        (None, Some(p)) => p.tick_value(),
        (None, None) => return Err(missing("instrument", "tick_value")),
    };

    Instrument::new(tick_size, tick_value)
}

fn validate_instrument(config: &dyn ConfigPort) -> Result<(), RiskCalcError> {
    match resolve_instrument(config) {
        Ok(_) => Ok(()),
        Err(RiskCalcError::UnknownInstrument { name }) => Err(invalid(
            "instrument",
            "preset",
            format!("unknown preset {name}"),
        )),
        Err(RiskCalcError::InvalidParameter { name, reason }) => {
            Err(invalid("instrument", &name, format!("{name} {reason}")))
        }
        Err(e) => Err(e),
    }
}

fn validate_account(config: &dyn ConfigPort) -> Result<(), RiskCalcError> {
    if let Some(size) = parse_double(config, "account", "size")? {
        if size < 0.0 {
            return Err(invalid("account", "size", "size must be non-negative"));
        }
    }
    Ok(())
}

fn validate_trade(config: &dyn ConfigPort) -> Result<(), RiskCalcError> {
    if let Some(dir) = config.get_string("trade", "direction") {
        dir.parse::<Direction>()
            .map_err(|e| invalid("trade", "direction", e.to_string()))?;
    }
    if let Some(mode) = config.get_string("trade", "mode") {
        mode.parse::<DivisionMode>()
            .map_err(|e| invalid("trade", "mode", e.to_string()))?;
    }
    if let Some(risk) = parse_double(config, "trade", "max_risk")? {
        if risk < 0.0 {
            return Err(invalid("trade", "max_risk", "max_risk must be non-negative"));
        }
    }
    Ok(())
}

fn validate_scale(config: &dyn ConfigPort) -> Result<(), RiskCalcError> {
    if let Some(rows) = config.get_string("scale", "rows") {
        match rows.trim().parse::<usize>() {
            Ok(n) if (1..=MAX_SCALE_ROWS).contains(&n) => {}
            _ => {
                return Err(invalid(
                    "scale",
                    "rows",
                    format!("rows must be a whole number from 1 to {MAX_SCALE_ROWS}"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_breakeven(config: &dyn ConfigPort) -> Result<(), RiskCalcError> {
    let target = parse_double(config, "breakeven", "target")?;
    let contracts = parse_double(config, "breakeven", "contracts")?;
    match (target, contracts) {
        (Some(_), None) => Err(missing("breakeven", "contracts")),
        (None, Some(_)) => Err(missing("breakeven", "target")),
        _ => Ok(()),
    }
}
