#![allow(dead_code)]

use riskcalc::domain::error::RiskCalcError;
use riskcalc::domain::instrument::Instrument;
pub use riskcalc::domain::trade::{Fill, FillKind};
use riskcalc::ports::fill_port::FillPort;
use std::io::Write;

pub struct MockFillPort {
    pub fills: Vec<Fill>,
    pub error: Option<String>,
}

impl MockFillPort {
    pub fn new() -> Self {
        Self {
            fills: Vec::new(),
            error: None,
        }
    }

    pub fn with_fill(mut self, kind: FillKind, price: f64, contracts: f64) -> Self {
        self.fills.push(Fill::new(kind, price, contracts));
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl FillPort for MockFillPort {
    fn load_fills(&self) -> Result<Vec<Fill>, RiskCalcError> {
        if let Some(reason) = &self.error {
            return Err(RiskCalcError::FillParse {
                line: 0,
                reason: reason.clone(),
            });
        }
        Ok(self.fills.clone())
    }
}

pub fn es() -> Instrument {
    Instrument::new(0.25, 12.50).unwrap()
}

pub fn cl() -> Instrument {
    Instrument::new(0.01, 10.00).unwrap()
}

pub fn write_temp_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    path
}
