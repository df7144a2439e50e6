//! CSV fill adapter.
//!
//! Reads fills from a file with a `kind,price,contracts` header. Columns are
//! located by name, `contracts` may be omitted or left blank.

use std::fs;
use std::path::PathBuf;

use crate::domain::error::RiskCalcError;
use crate::domain::trade::{Fill, FillKind};
use crate::ports::fill_port::FillPort;

pub struct CsvFillAdapter {
    path: PathBuf,
}

impl CsvFillAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FillPort for CsvFillAdapter {
    fn load_fills(&self) -> Result<Vec<Fill>, RiskCalcError> {
        let content = fs::read_to_string(&self.path).map_err(|e| RiskCalcError::FillParse {
            line: 0,
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let fills = parse_fills(&content)?;
        tracing::debug!(path = %self.path.display(), count = fills.len(), "loaded fills");
        Ok(fills)
    }
}

pub fn parse_fills(content: &str) -> Result<Vec<Fill>, RiskCalcError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| RiskCalcError::FillParse {
            line: 1,
            reason: format!("CSV header error: {}", e),
        })?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    };
    let kind_col = column("kind").ok_or_else(|| RiskCalcError::FillParse {
        line: 1,
        reason: "missing kind column".into(),
    })?;
    let price_col = column("price").ok_or_else(|| RiskCalcError::FillParse {
        line: 1,
        reason: "missing price column".into(),
    })?;
    let contracts_col = column("contracts");

    let mut fills = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| RiskCalcError::FillParse {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            reason: format!("CSV parse error: {}", e),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let kind: FillKind = record
            .get(kind_col)
            .unwrap_or_default()
            .parse()
            .map_err(|e: RiskCalcError| RiskCalcError::FillParse {
                line,
                reason: e.to_string(),
            })?;

        let price = match record.get(price_col).filter(|s| !s.is_empty()) {
            Some(s) => s.parse::<f64>().map_err(|e| RiskCalcError::FillParse {
                line,
                reason: format!("invalid price value: {}", e),
            })?,
            // unpriced rows are kept and skipped when the trade is built
            None => 0.0,
        };

        let contracts = match contracts_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
        {
            Some(s) => Some(s.parse::<f64>().map_err(|e| RiskCalcError::FillParse {
                line,
                reason: format!("invalid contracts value: {}", e),
            })?),
            None => None,
        };

        fills.push(Fill {
            kind,
            price,
            contracts,
        });
    }

    Ok(fills)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_all_kinds() {
        let fills = parse_fills(
            "kind,price,contracts\n\
             entry,100.25,2\n\
             stop,99.00,2\n\
             exit,102.50,1\n\
             none,101,1\n",
        )
        .unwrap();
        assert_eq!(fills.len(), 4);
        assert_eq!(fills[0], Fill::new(FillKind::Entry, 100.25, 2.0));
        assert_eq!(fills[1].kind, FillKind::Stop);
        assert_eq!(fills[2].kind, FillKind::Exit);
        assert_eq!(fills[3].kind, FillKind::None);
    }

    #[test]
    fn blank_contracts_are_none() {
        let fills = parse_fills("kind,price,contracts\nentry,100,\n").unwrap();
        assert_eq!(fills[0].contracts, None);
    }

    #[test]
    fn contracts_column_is_optional() {
        let fills = parse_fills("price,kind\n100,Entry\n").unwrap();
        assert_eq!(fills[0].kind, FillKind::Entry);
        assert_eq!(fills[0].price, 100.0);
        assert_eq!(fills[0].contracts, None);
    }

    #[test]
    fn blank_price_reads_as_zero() {
        let fills = parse_fills("kind,price,contracts\nstop,,1\n").unwrap();
        assert_eq!(fills[0].price, 0.0);
    }

    #[test]
    fn comment_lines_skipped() {
        let fills = parse_fills("kind,price,contracts\n# scaled in\nentry,100,1\n").unwrap();
        assert_eq!(fills.len(), 1);
    }

    #[test]
    fn unknown_kind_reports_line() {
        let err = parse_fills("kind,price,contracts\nentry,100,1\ntarget,105,1\n").unwrap_err();
        assert!(matches!(err, RiskCalcError::FillParse { line: 3, .. }));
    }

    #[test]
    fn bad_price_rejected() {
        let err = parse_fills("kind,price,contracts\nentry,abc,1\n").unwrap_err();
        assert!(matches!(err, RiskCalcError::FillParse { line: 2, .. }));
    }

    #[test]
    fn missing_price_column_rejected() {
        let err = parse_fills("kind,contracts\nentry,1\n").unwrap_err();
        assert!(matches!(err, RiskCalcError::FillParse { line: 1, .. }));
    }

    #[test]
    fn load_fills_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fills.csv");
        fs::write(&path, "kind,price,contracts\nentry,4500.25,1\n").unwrap();

        let fills = CsvFillAdapter::new(path).load_fills().unwrap();
        assert_eq!(fills, vec![Fill::new(FillKind::Entry, 4500.25, 1.0)]);
    }

    #[test]
    fn load_fills_missing_file() {
        let adapter = CsvFillAdapter::new(PathBuf::from("/nonexistent/fills.csv"));
        assert!(adapter.load_fills().is_err());
    }
}
