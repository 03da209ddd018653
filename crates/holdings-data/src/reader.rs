//! Snapshot discovery and loading.
//!
//! Finds the monthly disclosure spreadsheets in an input folder and loads a
//! worksheet of each into the [`RawRow`] model consumed by the extractor.
//! Workbook containers are decoded with `calamine`; `.csv` exports with `csv`.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};
use holdings_core::models::{Cell, RawRow};
use holdings_core::{HoldingsError, Result};
use tracing::{debug, warn};

/// File extensions recognised as snapshots (compared case-insensitively).
pub const SNAPSHOT_EXTENSIONS: [&str; 6] = ["xls", "xlsx", "xlsm", "xlsb", "ods", "csv"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all snapshot files recursively under `input_dir`, sorted by path.
///
/// Office lock files (`~$…`, `.~lock…`) are ignored, as is `exclude`, the
/// run's own output when it lives in the same folder.
pub fn find_snapshot_files(input_dir: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
    if !input_dir.exists() {
        warn!("Input path does not exist: {}", input_dir.display());
        return Vec::new();
    }

    let excluded = exclude.and_then(|p| std::fs::canonicalize(p).ok());

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_snapshot_file(entry.path()))
        .map(|entry| entry.into_path())
        .filter(|path| match &excluded {
            Some(ex) => std::fs::canonicalize(path).map_or(true, |p| &p != ex),
            None => true,
        })
        .collect();

    files.sort();
    files
}

/// Load one worksheet of `path` as rows of cells.
///
/// `sheet` selects a worksheet by name; the first worksheet is used when it
/// is `None`. CSV files have a single implicit sheet and ignore `sheet`.
/// Row indices are absolute sheet positions: leading blank rows and columns
/// that the decoder trims are restored as empty cells.
pub fn load_grid(path: &Path, sheet: Option<&str>) -> Result<Vec<RawRow>> {
    std::fs::metadata(path).map_err(|source| HoldingsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = if has_extension(path, "csv") {
        load_csv_rows(path)?
    } else {
        load_workbook_rows(path, sheet)?
    };

    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_snapshot_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.starts_with("~$") || name.starts_with(".~lock") {
        return false;
    }
    SNAPSHOT_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn spreadsheet_error(path: &Path, reason: impl ToString) -> HoldingsError {
    HoldingsError::Spreadsheet {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn load_workbook_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(path, e))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| spreadsheet_error(path, format!("worksheet {name:?}: {e}")))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| spreadsheet_error(path, "workbook has no worksheets"))?
            .map_err(|e| spreadsheet_error(path, e))?,
    };

    Ok(range_to_rows(&range))
}

/// Convert a decoded range into absolutely positioned rows.
///
/// Range iterators yield coordinates relative to `range.start()`, so the
/// offset is re-applied here.
fn range_to_rows(range: &Range<Data>) -> Vec<RawRow> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let (start_row, start_col) = (start_row as usize, start_col as usize);

    let mut rows: Vec<RawRow> = (0..start_row)
        .map(|index| RawRow::new(index, Vec::new()))
        .collect();

    for (offset, data_row) in range.rows().enumerate() {
        let mut cells = vec![Cell::Empty; start_col];
        cells.extend(data_row.iter().map(data_to_cell));
        rows.push(RawRow::new(start_row + offset, cells));
    }

    rows
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
        _ => Cell::Empty,
    }
}

fn load_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| spreadsheet_error(path, e))?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| spreadsheet_error(path, e))?;
        let cells = record.iter().map(Cell::text).collect();
        rows.push(RawRow::new(index, cells));
    }
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
