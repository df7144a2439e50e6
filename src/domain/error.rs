//! Domain error types.

/// Top-level error type for riskcalc.
#[derive(Debug, thiserror::Error)]
pub enum RiskCalcError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{field} is undefined: {reason}")]
    UndefinedResult { field: String, reason: String },

    #[error("unknown instrument preset {name}")]
    UnknownInstrument { name: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("fill parse error on line {line}: {reason}")]
    FillParse { line: u64, reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RiskCalcError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn undefined(field: &str, reason: impl Into<String>) -> Self {
        Self::UndefinedResult {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&RiskCalcError> for std::process::ExitCode {
    fn from(err: &RiskCalcError) -> Self {
        let code: u8 = match err {
            RiskCalcError::Io(_) | RiskCalcError::Json(_) => 1,
            RiskCalcError::ConfigParse { .. }
            | RiskCalcError::ConfigMissing { .. }
            | RiskCalcError::ConfigInvalid { .. } => 2,
            RiskCalcError::InvalidParameter { .. } | RiskCalcError::UnknownInstrument { .. } => 3,
            RiskCalcError::UndefinedResult { .. } => 4,
            RiskCalcError::FillParse { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
