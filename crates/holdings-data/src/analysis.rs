//! Compile pipeline for Holdings Timeline.
//!
//! Drives discovery, extraction and merging over an input folder and returns
//! a [`CompileResult`] ready for the report layer.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use holdings_core::period::Period;
use holdings_core::{HoldingsError, Result};
use tracing::{debug, info, warn};

use crate::aggregator::Portfolio;
use crate::extractor::extract_section;
use crate::reader::{find_snapshot_files, load_grid};

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs for a compile run.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Worksheet to read from every workbook; the first sheet when `None`.
    pub sheet: Option<String>,
    /// File to leave out of discovery, normally the report being written.
    pub exclude: Option<PathBuf>,
}

/// A snapshot that contributed no holdings, and why.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub period: String,
    pub reason: String,
}

/// Metadata produced alongside the compile result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CompileMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Snapshot files found under the input folder.
    pub files_discovered: usize,
    /// Files whose section was merged.
    pub files_merged: usize,
    /// Files skipped with a recoverable error.
    pub files_skipped: usize,
    /// Distinct identifiers in the portfolio.
    pub holdings: usize,
    /// Distinct period labels observed.
    pub periods: usize,
    /// Wall-clock seconds spent reading and extracting.
    pub extract_time_seconds: f64,
    /// Wall-clock seconds spent merging.
    pub merge_time_seconds: f64,
}

/// The complete output of [`compile_holdings`].
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub portfolio: Portfolio,
    /// Observed periods in chronological order.
    pub periods: Vec<Period>,
    pub skipped: Vec<SkippedFile>,
    pub metadata: CompileMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full compile pipeline over `input_dir`.
///
/// 1. Discover snapshot files (sorted by path).
/// 2. For each file: derive its period, register it, load the grid and
///    extract the equity section.
/// 3. Merge every extracted section into one [`Portfolio`].
///
/// Files failing with a recoverable error are logged, listed in
/// [`CompileResult::skipped`] and otherwise ignored. No snapshot files at all
/// is fatal ([`HoldingsError::NoInputFiles`]).
pub fn compile_holdings(input_dir: &Path, options: &CompileOptions) -> Result<CompileResult> {
    let files = find_snapshot_files(input_dir, options.exclude.as_deref());
    if files.is_empty() {
        return Err(HoldingsError::NoInputFiles(input_dir.to_path_buf()));
    }
    info!("Found {} snapshot files in {}", files.len(), input_dir.display());

    let mut portfolio = Portfolio::new();
    let mut skipped = Vec::new();
    let mut files_merged = 0usize;
    let mut extract_time = 0.0f64;
    let mut merge_time = 0.0f64;

    for path in &files {
        let period = Period::from_path(path);
        portfolio.observe_period(&period);

        let extract_start = Instant::now();
        let extracted = load_grid(path, options.sheet.as_deref())
            .and_then(|rows| extract_section(rows, path));
        extract_time += extract_start.elapsed().as_secs_f64();

        match extracted {
            Ok(section) => {
                let merge_start = Instant::now();
                let stats = portfolio.merge_snapshot(&period, &section.records);
                merge_time += merge_start.elapsed().as_secs_f64();
                files_merged += 1;
                debug!(
                    "{}: {} holdings ({} new, {} updated, {} replaced)",
                    path.display(),
                    section.records.len(),
                    stats.created,
                    stats.updated,
                    stats.replaced
                );
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping {}: {}", path.display(), e);
                skipped.push(SkippedFile {
                    path: path.clone(),
                    period: period.label.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let periods = portfolio.ordered_periods();
    let metadata = CompileMetadata {
        generated_at: Utc::now().to_rfc3339(),
        files_discovered: files.len(),
        files_merged,
        files_skipped: skipped.len(),
        holdings: portfolio.len(),
        periods: periods.len(),
        extract_time_seconds: extract_time,
        merge_time_seconds: merge_time,
    };
    info!(
        "Compiled {} holdings across {} periods ({} files skipped)",
        metadata.holdings, metadata.periods, metadata.files_skipped
    );

    Ok(CompileResult {
        portfolio,
        periods,
        skipped,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
