//! Report serialization.
//!
//! The output format follows the destination's extension: `.csv` writes the
//! plain grid, anything else an `.xlsx` workbook with merged tier-1 headers
//! and per-metric number formats.

use std::path::Path;

use holdings_core::models::{Cell, Metric};
use holdings_core::{HoldingsError, Result};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::info;

use crate::matrix::{ReportMatrix, FIXED_COLUMNS, HEADER_ROWS};

/// Worksheet name of the consolidated report.
pub const REPORT_SHEET: &str = "Equity Analysis";

/// On-disk report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Xlsx,
    Csv,
}

impl ReportFormat {
    /// Pick the format from `path`'s extension; `.xlsx` unless it is `.csv`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.to_string_lossy().eq_ignore_ascii_case("csv") => ReportFormat::Csv,
            _ => ReportFormat::Xlsx,
        }
    }
}

/// Write `matrix` to `path`, replacing any existing file.
///
/// Any failure maps to [`HoldingsError::OutputWrite`].
pub fn write_report(matrix: &ReportMatrix, path: &Path) -> Result<()> {
    let format = ReportFormat::from_path(path);
    let outcome = match format {
        ReportFormat::Xlsx => write_xlsx(matrix, path).map_err(|e| e.to_string()),
        ReportFormat::Csv => write_csv(matrix, path).map_err(|e| e.to_string()),
    };
    outcome.map_err(|reason| HoldingsError::OutputWrite {
        path: path.to_path_buf(),
        reason,
    })?;

    info!(
        "Wrote {:?} report with {} holdings to {}",
        format,
        matrix.rows.len(),
        path.display()
    );
    Ok(())
}

/// Metric shown in grid column `column` (a metric column, i.e. `>= 3`).
fn metric_at(column: usize) -> Metric {
    Metric::ALL[(column - FIXED_COLUMNS) % 3]
}

fn write_xlsx(matrix: &ReportMatrix, path: &Path) -> std::result::Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(REPORT_SHEET)?;

    let plain = Format::new();
    let number_formats =
        Metric::ALL.map(|metric| Format::new().set_num_format(metric.value_kind().number_format()));
    let last_col = (matrix.column_count() - 1) as u16;

    for (r, cells) in matrix.to_grid().iter().enumerate() {
        let row = r as u32;
        for (c, cell) in cells.iter().enumerate() {
            let col = c as u16;
            match cell {
                Cell::Empty => continue,
                Cell::Text(text) if r == 0 => {
                    worksheet.merge_range(row, 0, row, last_col, text, &plain)?
                }
                Cell::Text(text) if r == 1 && c >= FIXED_COLUMNS => {
                    worksheet.merge_range(row, col, row, col + 2, text, &plain)?
                }
                Cell::Text(text) => worksheet.write_string(row, col, text)?,
                Cell::Number(n) if c >= FIXED_COLUMNS && r >= HEADER_ROWS => {
                    let format = &number_formats[metric_at(c).offset()];
                    worksheet.write_number_with_format(row, col, *n, format)?
                }
                Cell::Number(n) => worksheet.write_number(row, col, *n)?,
            };
        }
    }

    workbook.save(path)
}

fn write_csv(matrix: &ReportMatrix, path: &Path) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in matrix.to_grid() {
        writer.write_record(row.iter().map(Cell::as_text))?;
    }
    writer.flush()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
