//! Read a written report back into a [`ReportMatrix`].

use std::path::Path;

use holdings_core::Result;
use holdings_data::reader::load_grid;
use tracing::debug;

use crate::matrix::ReportMatrix;

/// Load the report at `path` (`.xlsx` or `.csv`) and parse it positionally.
///
/// Workbooks are read from their first worksheet.
pub fn load_report(path: &Path) -> Result<ReportMatrix> {
    let rows = load_grid(path, None)?;
    debug!("Parsing report {} ({} rows)", path.display(), rows.len());
    ReportMatrix::from_grid(&rows)
}
