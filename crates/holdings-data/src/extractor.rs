//! Section extraction for one disclosure snapshot.
//!
//! A snapshot lists several subsections (listed equities, arbitrage, debt,
//! cash, ...) under a header row whose position varies from month to month.
//! Extraction runs in two passes over an abstract row source:
//!
//! 1. **Header discovery** – the first row with both an ISIN and a Quantity
//!    header becomes the header row and yields the [`ColumnMap`].
//! 2. **Section scan** – a [`SectionScanner`] walks the following rows through
//!    `Seeking → Capturing → Done`, emitting one [`ExtractedRecord`] per
//!    captured row that carries an identifier.
//!
//! The row source is any `Iterator<Item = RawRow>`, so the state machine can
//! be driven without touching the filesystem.

use std::collections::HashMap;
use std::path::Path;

use holdings_core::header::{clean_text, normalize_cell};
use holdings_core::models::{CanonicalField, ExtractedRecord, MonthMetrics, RawRow};
use holdings_core::{HoldingsError, Result};
use tracing::debug;

/// Fragment of the row introducing the listed-equities subsection.
pub const START_MARKER: &str = "(a) listed";
/// Word that must accompany [`START_MARKER`] ("Stock Exchange(s)").
pub const START_MARKER_WORD: &str = "stock";
/// Phrases introducing an unrelated subsection, a subtotal or a grand total.
pub const STOP_MARKERS: [&str; 6] = [
    "arbitrage",
    "sub total",
    "total",
    "debt",
    "cash",
    "grand total",
];

// ── ColumnMap ─────────────────────────────────────────────────────────────────

/// Canonical field → column index for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<CanonicalField, usize>,
}

impl ColumnMap {
    /// Normalise every cell of `header`; the first column per field wins.
    pub fn from_header(header: &RawRow) -> Self {
        let mut columns = HashMap::new();
        for (index, cell) in header.cells.iter().enumerate() {
            if let Some(field) = normalize_cell(cell) {
                columns.entry(field).or_insert(index);
            }
        }
        Self { columns }
    }

    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// `true` when the map can serve as a header: it locates both the
    /// identifier and the quantity column.
    pub fn is_header(&self) -> bool {
        self.get(CanonicalField::Identifier).is_some() && self.get(CanonicalField::Quantity).is_some()
    }

    /// Trimmed text of `field` in `row`; empty when the column is unmapped.
    fn text(&self, row: &RawRow, field: CanonicalField) -> String {
        self.get(field)
            .map(|col| row.cell(col).as_text())
            .unwrap_or_default()
    }

    /// Numeric value of `field` in `row`. Blank and unparseable cells are
    /// both absent.
    fn number(&self, row: &RawRow, field: CanonicalField) -> Option<f64> {
        let cell = row.cell(self.get(field)?);
        if cell.is_empty() {
            return None;
        }
        let value = cell.as_number();
        if value.is_none() {
            debug!(
                "Row {}: {} (column {}); treating as absent",
                row.index,
                HoldingsError::UnparseableNumeric(cell.as_text()),
                field
            );
        }
        value
    }
}

// ── SectionScanner ────────────────────────────────────────────────────────────

/// States of the section scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    /// Looking for the listed-equities marker.
    Seeking,
    /// Inside the section; rows with an identifier are emitted.
    Capturing,
    /// A stop marker was seen. Terminal.
    Done,
}

/// Finite-state scanner over the rows following the header.
#[derive(Debug, Clone)]
pub struct SectionScanner {
    columns: ColumnMap,
    state: SectionState,
}

impl SectionScanner {
    pub fn new(columns: ColumnMap) -> Self {
        Self {
            columns,
            state: SectionState::Seeking,
        }
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    /// Feed one row. Returns the record to emit, if any.
    ///
    /// Marker rows (start and stop) are never emitted; rows fed after the
    /// scanner reached [`SectionState::Done`] are ignored.
    pub fn step(&mut self, row: &RawRow) -> Option<ExtractedRecord> {
        match self.state {
            SectionState::Seeking => {
                if is_start_marker(&self.marker_text(row)) {
                    debug!("Section start marker at row {}", row.index);
                    self.state = SectionState::Capturing;
                }
                None
            }
            SectionState::Capturing => {
                let text = self.marker_text(row);
                if STOP_MARKERS.iter().any(|m| text.contains(m)) {
                    debug!("Section stop marker at row {}: {:?}", row.index, text);
                    self.state = SectionState::Done;
                    return None;
                }
                self.build_record(row)
            }
            SectionState::Done => None,
        }
    }

    /// Cleaned text used for marker matching: the name cell when it has
    /// content, otherwise every cell of the row.
    fn marker_text(&self, row: &RawRow) -> String {
        let name_cell = self
            .columns
            .get(CanonicalField::Name)
            .map(|col| row.cell(col))
            .filter(|cell| !cell.is_empty());
        match name_cell {
            Some(cell) => clean_text(&cell.as_text()),
            None => clean_text(&row.joined_text()),
        }
    }

    fn build_record(&self, row: &RawRow) -> Option<ExtractedRecord> {
        let identifier = self.columns.text(row, CanonicalField::Identifier);
        if identifier.is_empty() {
            return None;
        }
        Some(ExtractedRecord {
            name: self.columns.text(row, CanonicalField::Name),
            identifier,
            rating: self.columns.text(row, CanonicalField::Rating),
            metrics: MonthMetrics {
                quantity: self.columns.number(row, CanonicalField::Quantity),
                market_value: self.columns.number(row, CanonicalField::MarketValue),
                pct_assets: self.columns.number(row, CanonicalField::PctAssets),
            },
        })
    }
}

fn is_start_marker(text: &str) -> bool {
    text.contains(START_MARKER) && text.contains(START_MARKER_WORD)
}

// ── Extraction ────────────────────────────────────────────────────────────────

/// Result of extracting one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionExtract {
    /// Captured holdings in sheet order.
    pub records: Vec<ExtractedRecord>,
    /// Sheet index of the header row.
    pub header_row: usize,
    /// `false` when the input ended while still capturing.
    pub terminated: bool,
}

/// Pull rows until the header row is found.
///
/// Rows before the header are consumed; the iterator is left positioned on
/// the first row after it.
pub fn find_header<I>(rows: &mut I) -> Option<(RawRow, ColumnMap)>
where
    I: Iterator<Item = RawRow>,
{
    rows.find_map(|row| {
        let columns = ColumnMap::from_header(&row);
        columns.is_header().then_some((row, columns))
    })
}

/// Extract the listed-equities holdings from one snapshot.
///
/// `source` only labels errors. Fails with [`HoldingsError::HeaderNotFound`]
/// when no header row exists and [`HoldingsError::EmptySection`] when the
/// section yields no holdings. Rows after a stop marker are never pulled from
/// `rows`.
pub fn extract_section<I>(rows: I, source: &Path) -> Result<SectionExtract>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut rows = rows.into_iter();

    let (header, columns) = find_header(&mut rows)
        .ok_or_else(|| HoldingsError::HeaderNotFound(source.to_path_buf()))?;
    debug!(
        "{}: header at row {}, {} columns mapped",
        source.display(),
        header.index,
        columns.columns.len()
    );

    let mut scanner = SectionScanner::new(columns);
    let mut records = Vec::new();

    for row in rows.by_ref() {
        if let Some(record) = scanner.step(&row) {
            records.push(record);
        }
        if scanner.state() == SectionState::Done {
            break;
        }
    }

    if records.is_empty() {
        return Err(HoldingsError::EmptySection(source.to_path_buf()));
    }

    let terminated = scanner.state() == SectionState::Done;
    if !terminated {
        debug!(
            "{}: section ran to the end of the sheet without a stop marker",
            source.display()
        );
    }

    Ok(SectionExtract {
        records,
        header_row: header.index,
        terminated,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use holdings_core::models::Cell;
    use std::cell::Cell as Counter;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn row(index: usize, cells: &[&str]) -> RawRow {
        RawRow::new(index, cells.iter().map(|c| Cell::text(*c)).collect())
    }

    fn header_row(index: usize) -> RawRow {
        row(
            index,
            &[
                "Name of the Instrument",
                "ISIN",
                "Industry / Rating",
                "Quantity",
                "Market value\n(Rs. in Lakhs)",
                "% to Net\nAssets",
            ],
        )
    }

    fn holding(index: usize, name: &str, isin: &str, qty: &str) -> RawRow {
        row(index, &[name, isin, "Banks", qty, "50.5", "1.2"])
    }

    /// A typical snapshot: title rows, header, equity section, then debt.
    fn snapshot() -> Vec<RawRow> {
        vec![
            row(0, &["Parag Parikh Flexi Cap Fund"]),
            row(1, &["Portfolio as on 31-Jan-2025"]),
            header_row(2),
            row(3, &["Equity & Equity related"]),
            row(4, &["(a) Listed / awaiting listing on Stock Exchanges"]),
            holding(5, "HDFC Bank Limited", "INE040A01034", "1,000"),
            row(6, &[]),
            holding(7, "ITC Limited", "INE154A01025", "250"),
            row(8, &["Sub Total", "", "", "", "100.0", "2.4"]),
            row(9, &["(b) Unlisted"]),
            holding(10, "Should Not Appear", "INE999X01010", "5"),
        ]
    }

    fn path() -> &'static Path {
        Path::new("January_2025.xls")
    }

    // ── ColumnMap ─────────────────────────────────────────────────────────────

    #[test]
    fn test_column_map_from_header() {
        let map = ColumnMap::from_header(&header_row(0));
        assert_eq!(map.get(CanonicalField::Name), Some(0));
        assert_eq!(map.get(CanonicalField::Identifier), Some(1));
        assert_eq!(map.get(CanonicalField::Rating), Some(2));
        assert_eq!(map.get(CanonicalField::Quantity), Some(3));
        assert_eq!(map.get(CanonicalField::MarketValue), Some(4));
        assert_eq!(map.get(CanonicalField::PctAssets), Some(5));
        assert!(map.is_header());
    }

    #[test]
    fn test_column_map_duplicate_keeps_first() {
        let map = ColumnMap::from_header(&row(0, &["ISIN", "Quantity", "ISIN Code", "Yield"]));
        assert_eq!(map.get(CanonicalField::Identifier), Some(0));
        assert_eq!(map.get(CanonicalField::MarketValue), None);
    }

    #[test]
    fn test_column_map_without_quantity_is_not_header() {
        let map = ColumnMap::from_header(&row(0, &["Name of the Instrument", "ISIN"]));
        assert!(!map.is_header());
    }

    // ── find_header ───────────────────────────────────────────────────────────

    #[test]
    fn test_find_header_skips_preamble() {
        let mut rows = snapshot().into_iter();
        let (header, _) = find_header(&mut rows).unwrap();
        assert_eq!(header.index, 2);
        assert_eq!(rows.next().unwrap().index, 3);
    }

    // ── extract_section ───────────────────────────────────────────────────────

    #[test]
    fn test_extract_typical_snapshot() {
        let extract = extract_section(snapshot(), path()).unwrap();
        assert_eq!(extract.header_row, 2);
        assert!(extract.terminated);

        let ids: Vec<&str> = extract
            .records
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["INE040A01034", "INE154A01025"]);

        let first = &extract.records[0];
        assert_eq!(first.name, "HDFC Bank Limited");
        assert_eq!(first.rating, "Banks");
        assert_eq!(first.metrics.quantity, Some(1000.0));
        assert_eq!(first.metrics.market_value, Some(50.5));
        assert_eq!(first.metrics.pct_assets, Some(1.2));
    }

    #[test]
    fn test_extract_header_not_found() {
        let rows = vec![row(0, &["Name", "Code"]), row(1, &["x", "y"])];
        let err = extract_section(rows, path()).unwrap_err();
        assert!(matches!(err, HoldingsError::HeaderNotFound(_)));
    }

    #[test]
    fn test_extract_empty_section() {
        let rows = vec![
            header_row(0),
            row(1, &["(a) Listed / awaiting listing on Stock Exchanges"]),
            row(2, &["Sub Total"]),
        ];
        let err = extract_section(rows, path()).unwrap_err();
        assert!(matches!(err, HoldingsError::EmptySection(_)));
    }

    #[test]
    fn test_extract_without_start_marker_is_empty() {
        let rows = vec![header_row(0), holding(1, "A", "INE1", "1")];
        let err = extract_section(rows, path()).unwrap_err();
        assert!(matches!(err, HoldingsError::EmptySection(_)));
    }

    #[test]
    fn test_extract_singular_stock_exchange_marker() {
        let rows = vec![
            header_row(0),
            row(1, &["(a) Listed /  awaiting\nlisting on Stock Exchange"]),
            holding(2, "A", "INE1", "1"),
        ];
        let extract = extract_section(rows, path()).unwrap();
        assert_eq!(extract.records.len(), 1);
    }

    #[test]
    fn test_extract_unterminated_section_keeps_all_rows() {
        let mut rows = vec![
            header_row(0),
            row(1, &["(a) Listed / awaiting listing on Stock Exchanges"]),
        ];
        for i in 0..25 {
            rows.push(holding(2 + i, "Holding", &format!("INE{i:03}"), "10"));
        }
        let extract = extract_section(rows, path()).unwrap();
        assert_eq!(extract.records.len(), 25);
        assert!(!extract.terminated);
    }

    #[test]
    fn test_extract_never_emits_empty_identifier() {
        let rows = vec![
            header_row(0),
            row(1, &["(a) Listed / awaiting listing on Stock Exchanges"]),
            row(2, &["Heading without ISIN", "", "", "10"]),
            row(3, &["Blank ISIN", "   ", "", "10"]),
            holding(4, "Real", "INE777", "10"),
        ];
        let extract = extract_section(rows, path()).unwrap();
        assert!(extract.records.iter().all(|r| !r.identifier.is_empty()));
        assert_eq!(extract.records.len(), 1);
    }

    #[test]
    fn test_extract_stops_pulling_rows_after_done() {
        let pulled = Counter::new(0usize);
        let rows = snapshot().into_iter().inspect(|_| pulled.set(pulled.get() + 1));
        extract_section(rows, path()).unwrap();
        // Rows 0..=8 are pulled; the stop marker is row 8.
        assert_eq!(pulled.get(), 9);
    }

    #[test]
    fn test_extract_marker_in_other_column_when_name_blank() {
        let rows = vec![
            header_row(0),
            row(1, &["", "(a) Listed / awaiting listing on Stock Exchanges"]),
            holding(2, "A", "INE1", "1"),
            row(3, &["", "", "", "", "Total"]),
            holding(4, "B", "INE2", "1"),
        ];
        let extract = extract_section(rows, path()).unwrap();
        assert_eq!(extract.records.len(), 1);
        assert!(extract.terminated);
    }

    #[test]
    fn test_extract_unparseable_numeric_is_absent() {
        let rows = vec![
            header_row(0),
            row(1, &["(a) Listed / awaiting listing on Stock Exchanges"]),
            row(2, &["A", "INE1", "", "NIL", "", "0"]),
        ];
        let extract = extract_section(rows, path()).unwrap();
        let metrics = extract.records[0].metrics;
        assert_eq!(metrics.quantity, None);
        assert_eq!(metrics.market_value, None);
        assert_eq!(metrics.pct_assets, Some(0.0));
    }

    #[test]
    fn test_extract_numeric_identifier_cell() {
        let mut holding_row = holding(2, "A", "", "1");
        holding_row.cells[1] = Cell::Number(12345.0);
        let rows = vec![
            header_row(0),
            row(1, &["(a) Listed / awaiting listing on Stock Exchanges"]),
            holding_row,
        ];
        let extract = extract_section(rows, path()).unwrap();
        assert_eq!(extract.records[0].identifier, "12345");
    }

    // ── SectionScanner ────────────────────────────────────────────────────────

    #[test]
    fn test_scanner_state_transitions() {
        let mut scanner = SectionScanner::new(ColumnMap::from_header(&header_row(0)));
        assert_eq!(scanner.state(), SectionState::Seeking);

        // Stop markers are ignored while seeking.
        assert!(scanner.step(&row(1, &["Grand Total"])).is_none());
        assert_eq!(scanner.state(), SectionState::Seeking);

        scanner.step(&row(2, &["(a) Listed / awaiting listing on Stock Exchanges"]));
        assert_eq!(scanner.state(), SectionState::Capturing);

        assert!(scanner.step(&holding(3, "A", "INE1", "1")).is_some());

        scanner.step(&row(4, &["Debt Instruments"]));
        assert_eq!(scanner.state(), SectionState::Done);

        assert!(scanner.step(&holding(5, "B", "INE2", "1")).is_none());
        assert_eq!(scanner.state(), SectionState::Done);
    }
}
