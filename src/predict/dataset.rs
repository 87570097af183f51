// src/predict/dataset.rs
//! Reference listings dataset. The only thing the predictor needs from it is
//! the largest observed price, used to scale `normalized_price`.

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Used when the dataset is missing or unreadable.
pub const FALLBACK_MAX_PRICE: f64 = 100_000.0;

const PRICE_COLUMN: &str = "price";

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDataset {
    /// Rows with a usable price.
    pub rows: usize,
    pub max_price: f64,
}

fn unquote(cell: &str) -> &str {
    let t = cell.trim();
    t.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(t)
}

impl ReferenceDataset {
    /// Parse a simple comma-separated file with a header row. Cells must not
    /// contain embedded commas.
    pub fn from_csv_str(s: &str) -> Result<Self> {
        let mut lines = s.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().ok_or_else(|| anyhow!("dataset is empty"))?;
        let col = header
            .split(',')
            .position(|h| unquote(h).eq_ignore_ascii_case(PRICE_COLUMN))
            .ok_or_else(|| anyhow!("dataset has no `{PRICE_COLUMN}` column"))?;

        let mut rows = 0usize;
        let mut max_price = f64::NEG_INFINITY;
        for line in lines {
            let Some(cell) = line.split(',').nth(col) else {
                continue;
            };
            let Ok(v) = unquote(cell).parse::<f64>() else {
                continue;
            };
            if v.is_finite() && v > 0.0 {
                rows += 1;
                max_price = max_price.max(v);
            }
        }

        if rows == 0 {
            bail!("dataset has no positive prices");
        }
        Ok(Self { rows, max_price })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading reference dataset {}", path.display()))?;
        Self::from_csv_str(&content)
            .with_context(|| format!("parsing reference dataset {}", path.display()))
    }
}

/// Max observed price from the dataset at `path`, or `FALLBACK_MAX_PRICE`.
pub fn max_observed_price(path: &Path) -> f64 {
    match ReferenceDataset::from_path(path) {
        Ok(ds) => {
            info!(rows = ds.rows, max_price = ds.max_price, "reference dataset loaded");
            ds.max_price
        }
        Err(e) => {
            warn!(error = ?e, fallback = FALLBACK_MAX_PRICE, "reference dataset unavailable");
            FALLBACK_MAX_PRICE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_max_price_column() {
        let csv = "year,engine_cc,\"price\",rating\n2019,600,35000,7.5\n2021,300,\"52000\",8\n\n2015,125,n/a,4\n";
        let ds = ReferenceDataset::from_csv_str(csv).unwrap();
        assert_eq!(ds.rows, 2);
        assert_eq!(ds.max_price, 52_000.0);
    }

    #[test]
    fn missing_column_or_rows_is_an_error() {
        assert!(ReferenceDataset::from_csv_str("year,km\n2019,100\n").is_err());
        assert!(ReferenceDataset::from_csv_str("price\n0\n-5\n").is_err());
        assert!(ReferenceDataset::from_csv_str("").is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let p = Path::new("definitely/not/here.csv");
        assert_eq!(max_observed_price(p), FALLBACK_MAX_PRICE);
    }

    #[test]
    fn file_on_disk_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("ref.csv");
        fs::write(&p, "price\n12000\n99000\n").unwrap();
        assert_eq!(max_observed_price(&p), 99_000.0);
    }
}
