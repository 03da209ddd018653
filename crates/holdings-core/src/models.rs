use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Cells and rows ─────────────────────────────────────────────────────────────

/// A single spreadsheet cell, reduced to the three shapes the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Any textual content (untrimmed, as read from the source).
    Text(String),
    /// A numeric cell. Spreadsheet dates are carried as their serial number.
    Number(f64),
    /// Blank, error or otherwise valueless cell.
    #[default]
    Empty,
}

impl Cell {
    /// Build a text cell, mapping whitespace-only input to [`Cell::Empty`].
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// `true` for blank cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Trimmed textual rendering of the cell.
    ///
    /// Integral numbers are rendered without a fractional part so that
    /// identifiers stored as numbers keep their natural spelling.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }

    /// Numeric reading of the cell.
    ///
    /// Text is accepted when it parses as a number once thousands separators
    /// are removed. Returns `None` for blanks and unparseable text.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
            }
            Cell::Empty => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// One row of a raw snapshot. Carries no meaning until headers are normalised.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    /// Zero-based position of the row within its sheet.
    pub index: usize,
    /// Cells in column order.
    pub cells: Vec<Cell>,
}

impl RawRow {
    pub fn new(index: usize, cells: Vec<Cell>) -> Self {
        Self { index, cells }
    }

    /// Cell at `column`, or [`Cell::Empty`] past the end of the row.
    pub fn cell(&self, column: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    /// `true` when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    /// All non-blank cells joined with a single space.
    pub fn joined_text(&self) -> String {
        self.cells
            .iter()
            .filter(|c| !c.is_empty())
            .map(Cell::as_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ── Canonical fields ───────────────────────────────────────────────────────────

/// The fixed semantic columns that raw headers are normalised into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalField {
    Name,
    Identifier,
    Rating,
    Quantity,
    MarketValue,
    PctAssets,
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CanonicalField::Name => "Name",
            CanonicalField::Identifier => "ISIN",
            CanonicalField::Rating => "Rating",
            CanonicalField::Quantity => "Quantity",
            CanonicalField::MarketValue => "MarketValue",
            CanonicalField::PctAssets => "PctAssets",
        };
        write!(f, "{}", s)
    }
}

// ── Metrics ────────────────────────────────────────────────────────────────────

/// How a metric column should be presented by a formatting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Whole units, grouped.
    Count,
    /// Monetary amount with two decimals, grouped.
    Currency,
    /// Share of net assets, already expressed in percent.
    Percentage,
}

impl ValueKind {
    /// Spreadsheet number-format string for this kind (Indian digit grouping).
    pub fn number_format(self) -> &'static str {
        match self {
            ValueKind::Count => r"[>=10000000]##\,##\,##\,##0;[>=100000]##\,##\,##0;##,##0",
            ValueKind::Currency => {
                r"[>=10000000]##\,##\,##\,##0.00;[>=100000]##\,##\,##0.00;##,##0.00"
            }
            ValueKind::Percentage => r#"0.00"%""#,
        }
    }
}

/// The three per-period metrics of a holding, in report column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Quantity,
    MarketValue,
    PctAssets,
}

impl Metric {
    /// All metrics in the order they appear inside a period group.
    pub const ALL: [Metric; 3] = [Metric::Quantity, Metric::MarketValue, Metric::PctAssets];

    /// Offset of this metric inside its three-column period group.
    pub fn offset(self) -> usize {
        match self {
            Metric::Quantity => 0,
            Metric::MarketValue => 1,
            Metric::PctAssets => 2,
        }
    }

    /// Tier-2 header written above this metric's column.
    pub fn header(self) -> &'static str {
        match self {
            Metric::Quantity => "Quantity",
            Metric::MarketValue => "Market Value (Rs. Lakhs)",
            Metric::PctAssets => "% Net Assets",
        }
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Metric::Quantity => ValueKind::Count,
            Metric::MarketValue => ValueKind::Currency,
            Metric::PctAssets => ValueKind::Percentage,
        }
    }
}

/// Metrics of one holding for one period. `None` means the value was absent
/// or unparseable in the source, which is not the same as an explicit zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthMetrics {
    pub quantity: Option<f64>,
    pub market_value: Option<f64>,
    pub pct_assets: Option<f64>,
}

impl MonthMetrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Quantity => self.quantity,
            Metric::MarketValue => self.market_value,
            Metric::PctAssets => self.pct_assets,
        }
    }

    /// Value with absence coerced to zero, as used in sums and rendering.
    pub fn value_or_zero(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(0.0)
    }
}

// ── Records ────────────────────────────────────────────────────────────────────

/// One holding row captured from a snapshot's equity section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Instrument name; may be empty.
    pub name: String,
    /// Security identifier (ISIN). Never empty.
    pub identifier: String,
    /// Industry or rating; may be empty.
    pub rating: String,
    pub metrics: MonthMetrics,
}

/// The per-identifier aggregate spanning every processed period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub identifier: String,
    pub name: String,
    pub rating: String,
    /// Period label → metrics. At most one entry per period.
    pub months: BTreeMap<String, MonthMetrics>,
}

impl PortfolioEntry {
    /// Start a new entry from its first sighting.
    pub fn from_record(record: &ExtractedRecord) -> Self {
        Self {
            identifier: record.identifier.clone(),
            name: record.name.clone(),
            rating: record.rating.clone(),
            months: BTreeMap::new(),
        }
    }

    /// Metrics for `period`, or all-absent when the holding was not seen then.
    pub fn metrics_for(&self, period: &str) -> MonthMetrics {
        self.months.get(period).copied().unwrap_or_default()
    }
}
