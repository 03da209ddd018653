//! Consumer read-back dataset.
//!
//! The JSON shape served to presentation layers:
//!
//! ```json
//! {
//!   "months": ["January_2025", "February_2025"],
//!   "records": [
//!     { "Name": "Acme", "ISIN": "INE123", "Rating": "Banks",
//!       "Months": { "January_2025": { "Quantity": 100.0, "Value": 50.5, "Pct": 1.2 } } }
//!   ]
//! }
//! ```
//!
//! It is derived purely from a [`ReportMatrix`], so it can be rebuilt from
//! any written report.

use std::path::Path;

use holdings_core::models::Metric;
use holdings_core::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::loader::load_report;
use crate::matrix::{MatrixRow, ReportMatrix};

/// One period's figures for one holding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthFigures {
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Pct")]
    pub pct: f64,
}

/// One holding with a figure set for every period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ISIN")]
    pub isin: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    /// Period label → figures, in report column order.
    #[serde(rename = "Months")]
    pub months: IndexMap<String, MonthFigures>,
}

impl DatasetRecord {
    fn from_row(row: &MatrixRow, periods: &[String]) -> Self {
        let months = periods
            .iter()
            .enumerate()
            .map(|(i, label)| {
                (
                    label.clone(),
                    MonthFigures {
                        quantity: row.value(i, Metric::Quantity),
                        value: row.value(i, Metric::MarketValue),
                        pct: row.value(i, Metric::PctAssets),
                    },
                )
            })
            .collect();
        Self {
            name: row.name.clone(),
            isin: row.identifier.clone(),
            rating: row.rating.clone(),
            months,
        }
    }
}

/// Period sequence plus every holding's per-period figures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HoldingsDataset {
    /// Period labels in report column order.
    pub months: Vec<String>,
    pub records: Vec<DatasetRecord>,
}

impl HoldingsDataset {
    pub fn from_matrix(matrix: &ReportMatrix) -> Self {
        Self {
            months: matrix.periods.clone(),
            records: matrix
                .rows
                .iter()
                .map(|row| DatasetRecord::from_row(row, &matrix.periods))
                .collect(),
        }
    }

    pub fn record(&self, isin: &str) -> Option<&DatasetRecord> {
        self.records.iter().find(|r| r.isin == isin)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Load a written report and derive its dataset.
pub fn load_dataset(path: &Path) -> Result<HoldingsDataset> {
    let matrix = load_report(path)?;
    Ok(HoldingsDataset::from_matrix(&matrix))
}
