//! Header normalisation.
//!
//! Maps free-form header text from a disclosure sheet onto a
//! [`CanonicalField`]. Rules are substring tests applied in a fixed priority
//! order; the first matching rule wins so overlapping keywords never map one
//! column to two fields.

use crate::models::{CanonicalField, Cell};

/// Ordered substring rules. Earlier entries take priority.
const RULES: &[(&[&str], CanonicalField)] = &[
    (&["instrument"], CanonicalField::Name),
    (&["isin"], CanonicalField::Identifier),
    (&["industry", "rating"], CanonicalField::Rating),
    (&["quantity"], CanonicalField::Quantity),
    (&["market value", "rs. in lakhs"], CanonicalField::MarketValue),
    (&["% to net assets", "percentage", "%"], CanonicalField::PctAssets),
];

/// Lower-case `text` and collapse every run of whitespace (including
/// embedded newlines) into a single space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalise one header's text. Returns `None` for unrecognised headers.
pub fn normalize_header(text: &str) -> Option<CanonicalField> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| cleaned.contains(n)))
        .map(|(_, field)| *field)
}

/// Normalise a header cell. Only text cells can name a field.
pub fn normalize_cell(cell: &Cell) -> Option<CanonicalField> {
    match cell {
        Cell::Text(s) => normalize_header(s),
        _ => None,
    }
}
