//! Period labels and their chronological ordering.
//!
//! A snapshot's period comes from its file name, by convention
//! `<MonthName>_<Year>` (e.g. `March_2025`). Labels that do not follow the
//! convention are kept but sort after every well-formed period.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

use crate::error::{HoldingsError, Result};

/// Calendar month names, indexed 0–11.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ── PeriodKey ──────────────────────────────────────────────────────────────────

/// Sort key derived from a period label: `(year, month-index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: u32,
    pub month: u32,
}

impl PeriodKey {
    /// Key assigned to malformed labels so they land at the end.
    pub const SORT_LAST: PeriodKey = PeriodKey {
        year: u32::MAX,
        month: u32::MAX,
    };

    /// Strictly parse a `<MonthName>_<Year>` label.
    ///
    /// The month is matched case-insensitively against the full English month
    /// names; the year must consist of ASCII digits only.
    pub fn parse(label: &str) -> Result<PeriodKey> {
        let malformed = || HoldingsError::MalformedPeriodLabel(label.to_string());

        let parts: Vec<&str> = label.trim().split('_').collect();
        let [month_name, year] = parts.as_slice() else {
            return Err(malformed());
        };

        let month = MONTH_NAMES
            .iter()
            .position(|m| m.eq_ignore_ascii_case(month_name))
            .ok_or_else(malformed)?;

        if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }
        let year: u32 = year.parse().map_err(|_| malformed())?;

        Ok(PeriodKey {
            year,
            month: month as u32,
        })
    }

    /// Lenient variant of [`PeriodKey::parse`]: malformed labels are logged
    /// and mapped to [`PeriodKey::SORT_LAST`].
    pub fn from_label(label: &str) -> PeriodKey {
        match Self::parse(label) {
            Ok(key) => key,
            Err(e) => {
                warn!("{}; sorting it after all dated periods", e);
                Self::SORT_LAST
            }
        }
    }

    pub fn is_sort_last(&self) -> bool {
        *self == Self::SORT_LAST
    }
}

// ── Period ─────────────────────────────────────────────────────────────────────

/// A snapshot's period: the opaque label plus its derived ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub label: String,
    pub key: PeriodKey,
}

impl Period {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let key = PeriodKey::from_label(&label);
        Self { label, key }
    }

    /// Derive the period from a snapshot's file name (its stem).
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(stem)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Order periods chronologically.
///
/// `periods` must be in first-seen order; the sort is stable, so equal keys
/// (including every malformed label) keep that order.
pub fn order_periods(periods: &[Period]) -> Vec<Period> {
    let mut ordered = periods.to_vec();
    ordered.sort_by_key(|p| p.key);
    ordered
}
