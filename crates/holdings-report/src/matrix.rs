//! Pivot of a merged [`Portfolio`] into the tiered report matrix, and back.
//!
//! Grid layout (0-based rows):
//!
//! | row | content                                                        |
//! |-----|----------------------------------------------------------------|
//! | 0   | title, spanning every column                                   |
//! | 1   | fixed headers, then each period label at `3 + 3·i` (3 columns) |
//! | 2   | metric headers, repeating per period                           |
//! | 3.. | one row per holding: name, identifier, rating, metric triples  |
//! | N   | `Total` followed by the column sums                            |
//!
//! Data rows carry no column names, so readers must use exactly these
//! positional offsets. [`ReportMatrix::from_grid`] is that reader.

use holdings_core::models::{Cell, Metric, MonthMetrics, PortfolioEntry, RawRow};
use holdings_core::period::Period;
use holdings_core::{HoldingsError, Result};
use holdings_data::aggregator::Portfolio;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Headers of the three fixed leading columns.
pub const FIXED_HEADERS: [&str; 3] = ["Name of the Instrument", "ISIN", "Industry/Rating"];

/// Number of fixed leading columns.
pub const FIXED_COLUMNS: usize = FIXED_HEADERS.len();

/// Rows above the first holding: title, period labels, metric headers.
pub const HEADER_ROWS: usize = 3;

/// Label in the first column of the totals row.
pub const TOTAL_LABEL: &str = "Total";

/// Grid column of `metric` for the `period_index`-th period.
pub fn metric_column(period_index: usize, metric: Metric) -> usize {
    FIXED_COLUMNS + 3 * period_index + metric.offset()
}

// ── MatrixRow ─────────────────────────────────────────────────────────────────

/// One holding row. `values[i]` is the metric triple of the `i`-th period,
/// with absent metrics already coerced to `0.0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatrixRow {
    pub name: String,
    pub identifier: String,
    pub rating: String,
    pub values: Vec<[f64; 3]>,
}

impl MatrixRow {
    pub fn value(&self, period_index: usize, metric: Metric) -> f64 {
        self.values
            .get(period_index)
            .map(|triple| triple[metric.offset()])
            .unwrap_or(0.0)
    }
}

// ── ReportMatrix ──────────────────────────────────────────────────────────────

/// The consolidated report as a logical table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportMatrix {
    pub title: String,
    /// Period labels in column order.
    pub periods: Vec<String>,
    /// Holdings in discovery order.
    pub rows: Vec<MatrixRow>,
    /// Per-period column sums, parallel to `periods`.
    pub totals: Vec<[f64; 3]>,
}

impl ReportMatrix {
    /// Build the matrix from a merged portfolio.
    ///
    /// Periods follow chronological order (malformed labels last); rows follow
    /// the portfolio's discovery order.
    pub fn assemble(portfolio: &Portfolio, title: &str) -> Self {
        let periods: Vec<String> = portfolio
            .ordered_periods()
            .into_iter()
            .map(|p| p.label)
            .collect();

        let rows: Vec<MatrixRow> = portfolio
            .entries()
            .iter()
            .map(|entry| MatrixRow {
                name: entry.name.clone(),
                identifier: entry.identifier.clone(),
                rating: entry.rating.clone(),
                values: periods
                    .iter()
                    .map(|label| coerce(entry.months.get(label)))
                    .collect(),
            })
            .collect();

        let totals = column_totals(&rows, periods.len());
        debug!(
            "Assembled report: {} rows x {} periods",
            rows.len(),
            periods.len()
        );

        Self {
            title: title.to_string(),
            periods,
            rows,
            totals,
        }
    }

    /// Total grid width.
    pub fn column_count(&self) -> usize {
        FIXED_COLUMNS + 3 * self.periods.len()
    }

    /// Column sum for `period` and `metric`, if the period is present.
    pub fn total(&self, period: &str, metric: Metric) -> Option<f64> {
        let index = self.periods.iter().position(|p| p == period)?;
        self.totals.get(index).map(|t| t[metric.offset()])
    }

    pub fn row(&self, identifier: &str) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.identifier == identifier)
    }

    /// Serialize to the positional cell grid described in the module docs.
    /// Every row has exactly [`column_count`](Self::column_count) cells.
    pub fn to_grid(&self) -> Vec<Vec<Cell>> {
        let width = self.column_count();
        let mut grid = Vec::with_capacity(HEADER_ROWS + self.rows.len() + 1);

        let mut title = vec![Cell::Empty; width];
        title[0] = Cell::text(self.title.as_str());
        grid.push(title);

        let mut tier1 = vec![Cell::Empty; width];
        for (col, header) in FIXED_HEADERS.iter().enumerate() {
            tier1[col] = Cell::text(*header);
        }
        for (i, label) in self.periods.iter().enumerate() {
            tier1[metric_column(i, Metric::Quantity)] = Cell::text(label.as_str());
        }
        grid.push(tier1);

        let mut tier2 = vec![Cell::Empty; width];
        for i in 0..self.periods.len() {
            for metric in Metric::ALL {
                tier2[metric_column(i, metric)] = Cell::text(metric.header());
            }
        }
        grid.push(tier2);

        for row in &self.rows {
            let mut cells = vec![
                Cell::text(row.name.as_str()),
                Cell::text(row.identifier.as_str()),
                Cell::text(row.rating.as_str()),
            ];
            cells.extend(row.values.iter().flatten().map(|v| Cell::Number(*v)));
            cells.resize(width, Cell::Empty);
            grid.push(cells);
        }

        let mut totals = vec![Cell::text(TOTAL_LABEL), Cell::Empty, Cell::Empty];
        totals.extend(self.totals.iter().flatten().map(|v| Cell::Number(*v)));
        totals.resize(width, Cell::Empty);
        grid.push(totals);

        grid
    }

    /// Rebuild a matrix from a report grid.
    ///
    /// The title is read from the first cell. Periods come from the second
    /// row, every third column starting at column 3; blank label cells are
    /// skipped. Holding rows start at the fourth row, and rows whose first
    /// cell is blank are skipped. The row labelled `Total` with a blank
    /// identifier becomes the totals; they are recomputed when it is missing.
    /// Missing or unparseable metric cells read as `0.0`.
    pub fn from_grid(grid: &[RawRow]) -> Result<Self> {
        if grid.len() < HEADER_ROWS {
            return Err(HoldingsError::MalformedReport(format!(
                "expected at least {} header rows, found {}",
                HEADER_ROWS,
                grid.len()
            )));
        }

        let title = grid[0].cell(0).as_text();

        let header = &grid[1];
        let periods: Vec<String> = (FIXED_COLUMNS..header.cells.len())
            .step_by(3)
            .map(|col| header.cell(col))
            .filter(|cell| !cell.is_empty())
            .map(Cell::as_text)
            .collect();

        let mut rows = Vec::new();
        let mut totals = None;

        for raw in &grid[HEADER_ROWS..] {
            let first = raw.cell(0);
            if first.is_empty() {
                let identifier = raw.cell(1);
                if !identifier.is_empty() {
                    debug!(
                        "Row {}: skipping holding {} with no name",
                        raw.index,
                        identifier.as_text()
                    );
                }
                continue;
            }

            let identifier = raw.cell(1).as_text();
            let values: Vec<[f64; 3]> = (0..periods.len())
                .map(|i| Metric::ALL.map(|metric| read_number(raw, metric_column(i, metric))))
                .collect();

            if identifier.is_empty() && first.as_text() == TOTAL_LABEL {
                totals = Some(values);
                continue;
            }

            rows.push(MatrixRow {
                name: first.as_text(),
                identifier,
                rating: raw.cell(2).as_text(),
                values,
            });
        }

        let totals = totals.unwrap_or_else(|| column_totals(&rows, periods.len()));
        debug!(
            "Read back report: {} rows x {} periods",
            rows.len(),
            periods.len()
        );

        Ok(Self {
            title,
            periods,
            rows,
            totals,
        })
    }

    /// The identifier-keyed mapping this matrix represents.
    ///
    /// Every entry has metrics for every period, with zeros where the source
    /// was absent.
    pub fn into_portfolio(self) -> Portfolio {
        let mut portfolio = Portfolio::new();
        for label in &self.periods {
            portfolio.observe_period(&Period::new(label.as_str()));
        }

        for row in self.rows {
            let months = self
                .periods
                .iter()
                .zip(row.values)
                .map(|(label, [quantity, market_value, pct_assets])| {
                    (
                        label.clone(),
                        MonthMetrics {
                            quantity: Some(quantity),
                            market_value: Some(market_value),
                            pct_assets: Some(pct_assets),
                        },
                    )
                })
                .collect();
            portfolio.insert_entry(PortfolioEntry {
                identifier: row.identifier,
                name: row.name,
                rating: row.rating,
                months,
            });
        }

        portfolio
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn coerce(metrics: Option<&MonthMetrics>) -> [f64; 3] {
    match metrics {
        Some(m) => Metric::ALL.map(|metric| m.value_or_zero(metric)),
        None => [0.0; 3],
    }
}

fn column_totals(rows: &[MatrixRow], periods: usize) -> Vec<[f64; 3]> {
    let mut totals = vec![[0.0; 3]; periods];
    for row in rows {
        for (total, values) in totals.iter_mut().zip(&row.values) {
            for (t, v) in total.iter_mut().zip(values) {
                *t += v;
            }
        }
    }
    totals
}

fn read_number(row: &RawRow, column: usize) -> f64 {
    row.cell(column).as_number().unwrap_or(0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
