//! Cross-period merge of extracted holdings.
//!
//! [`Portfolio`] is the single accumulator of a run. Snapshots are folded into
//! it one at a time, in file-processing order:
//!
//! * an unseen identifier creates a [`PortfolioEntry`] (discovery order is
//!   kept and is the row order of the report);
//! * name and rating are filled only while still empty, so the first
//!   non-empty value sticks;
//! * metrics for a period replace whatever that period held before, so
//!   reprocessing a period never sums or duplicates.
//!
//! Absent metrics stay `None`; coercion to zero happens in the report layer.

use std::collections::HashMap;

use holdings_core::models::{ExtractedRecord, MonthMetrics, PortfolioEntry};
use holdings_core::period::{order_periods, Period};

// ── MergeStats ────────────────────────────────────────────────────────────────

/// Counts produced by merging one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Identifiers seen for the first time.
    pub created: usize,
    /// Identifiers already present in the portfolio.
    pub updated: usize,
    /// Records whose period already had metrics for that identifier.
    pub replaced: usize,
}

// ── Portfolio ─────────────────────────────────────────────────────────────────

/// Identifier-keyed holdings spanning every observed period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    entries: Vec<PortfolioEntry>,
    index: HashMap<String, usize>,
    periods: Vec<Period>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `period` as observed. Repeated labels are ignored.
    pub fn observe_period(&mut self, period: &Period) {
        if !self.periods.iter().any(|p| p.label == period.label) {
            self.periods.push(period.clone());
        }
    }

    /// Merge every record of one snapshot taken at `period`.
    pub fn merge_snapshot(&mut self, period: &Period, records: &[ExtractedRecord]) -> MergeStats {
        self.observe_period(period);

        let mut stats = MergeStats::default();
        for record in records {
            self.merge_record(&period.label, record, &mut stats);
        }
        stats
    }

    /// Entries in discovery order.
    pub fn entries(&self) -> &[PortfolioEntry] {
        &self.entries
    }

    pub fn get(&self, identifier: &str) -> Option<&PortfolioEntry> {
        self.index.get(identifier).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Observed periods in first-seen order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Observed periods in chronological order (malformed labels last).
    pub fn ordered_periods(&self) -> Vec<Period> {
        order_periods(&self.periods)
    }

    /// Append a fully formed entry, e.g. one rebuilt from a report.
    ///
    /// An entry whose identifier is already present replaces the existing one
    /// in place, keeping its position.
    pub fn insert_entry(&mut self, entry: PortfolioEntry) {
        match self.index.get(&entry.identifier) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index
                    .insert(entry.identifier.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn merge_record(&mut self, period: &str, record: &ExtractedRecord, stats: &mut MergeStats) {
        let position = match self.index.get(&record.identifier) {
            Some(&i) => {
                stats.updated += 1;
                i
            }
            None => {
                stats.created += 1;
                let i = self.entries.len();
                self.entries.push(PortfolioEntry::from_record(record));
                self.index.insert(record.identifier.clone(), i);
                i
            }
        };

        let entry = &mut self.entries[position];
        if entry.name.is_empty() && !record.name.is_empty() {
            entry.name = record.name.clone();
        }
        if entry.rating.is_empty() && !record.rating.is_empty() {
            entry.rating = record.rating.clone();
        }

        let metrics: MonthMetrics = record.metrics;
        if entry.months.insert(period.to_string(), metrics).is_some() {
            stats.replaced += 1;
        }
    }
}

/// Fold a sequence of `(period, records)` snapshots into a fresh portfolio.
///
/// The fold is strictly sequential; snapshot order decides which name sticks
/// and which metrics win for a repeated period.
pub fn fold_snapshots<I>(snapshots: I) -> Portfolio
where
    I: IntoIterator<Item = (Period, Vec<ExtractedRecord>)>,
{
    snapshots
        .into_iter()
        .fold(Portfolio::new(), |mut portfolio, (period, records)| {
            portfolio.merge_snapshot(&period, &records);
            portfolio
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(isin: &str, name: &str, qty: f64, value: f64, pct: f64) -> ExtractedRecord {
        ExtractedRecord {
            name: name.to_string(),
            identifier: isin.to_string(),
            rating: String::new(),
            metrics: MonthMetrics {
                quantity: Some(qty),
                market_value: Some(value),
                pct_assets: Some(pct),
            },
        }
    }

    fn metrics(qty: f64, value: f64, pct: f64) -> MonthMetrics {
        MonthMetrics {
            quantity: Some(qty),
            market_value: Some(value),
            pct_assets: Some(pct),
        }
    }

    // ── Scenario ──────────────────────────────────────────────────────────────

    #[test]
    fn test_two_file_scenario() {
        let portfolio = fold_snapshots(vec![
            (
                Period::new("January_2025"),
                vec![record("INE123", "Acme", 100.0, 50.5, 1.2)],
            ),
            (
                Period::new("February_2025"),
                vec![
                    record("INE123", "", 120.0, 60.0, 1.3),
                    record("INE999", "Beta", 10.0, 5.0, 0.1),
                ],
            ),
        ]);

        assert_eq!(portfolio.len(), 2);

        let acme = portfolio.get("INE123").unwrap();
        assert_eq!(acme.name, "Acme");
        assert_eq!(acme.months.len(), 2);
        assert_eq!(acme.months["January_2025"], metrics(100.0, 50.5, 1.2));
        assert_eq!(acme.months["February_2025"], metrics(120.0, 60.0, 1.3));

        let beta = portfolio.get("INE999").unwrap();
        assert_eq!(beta.name, "Beta");
        assert_eq!(beta.months.len(), 1);
        assert_eq!(beta.months["February_2025"], metrics(10.0, 5.0, 0.1));
        assert!(!beta.months.contains_key("January_2025"));
    }

    // ── Metadata policy ───────────────────────────────────────────────────────

    #[test]
    fn test_first_non_empty_name_and_rating_win() {
        let mut first = record("INE1", "", 1.0, 1.0, 1.0);
        first.rating = String::new();
        let mut second = record("INE1", "Original Name", 1.0, 1.0, 1.0);
        second.rating = "Banks".to_string();
        let mut third = record("INE1", "Renamed Ltd", 1.0, 1.0, 1.0);
        third.rating = "Finance".to_string();

        let portfolio = fold_snapshots(vec![
            (Period::new("January_2025"), vec![first]),
            (Period::new("February_2025"), vec![second]),
            (Period::new("March_2025"), vec![third]),
        ]);

        let entry = portfolio.get("INE1").unwrap();
        assert_eq!(entry.name, "Original Name");
        assert_eq!(entry.rating, "Banks");
    }

    // ── Period policy ─────────────────────────────────────────────────────────

    #[test]
    fn test_reprocessing_same_period_is_idempotent() {
        let period = Period::new("January_2025");
        let records = vec![record("INE1", "A", 100.0, 10.0, 1.0)];

        let mut portfolio = Portfolio::new();
        let first = portfolio.merge_snapshot(&period, &records);
        let second = portfolio.merge_snapshot(&period, &records);

        assert_eq!(first.created, 1);
        assert_eq!(second.updated, 1);
        assert_eq!(second.replaced, 1);
        assert_eq!(portfolio.len(), 1);
        assert_eq!(portfolio.periods().len(), 1);
        let entry = portfolio.get("INE1").unwrap();
        assert_eq!(entry.months.len(), 1);
        assert_eq!(entry.months["January_2025"], metrics(100.0, 10.0, 1.0));
    }

    #[test]
    fn test_later_file_for_same_period_replaces_metrics() {
        let period = Period::new("January_2025");
        let mut portfolio = Portfolio::new();
        portfolio.merge_snapshot(&period, &[record("INE1", "A", 100.0, 10.0, 1.0)]);
        portfolio.merge_snapshot(&period, &[record("INE1", "A", 90.0, 9.0, 0.9)]);

        let entry = portfolio.get("INE1").unwrap();
        assert_eq!(entry.months["January_2025"], metrics(90.0, 9.0, 0.9));
    }

    #[test]
    fn test_absent_metrics_are_not_coerced() {
        let mut rec = record("INE1", "A", 0.0, 0.0, 0.0);
        rec.metrics.market_value = None;

        let portfolio = fold_snapshots(vec![(Period::new("May_2025"), vec![rec])]);
        let stored = portfolio.get("INE1").unwrap().months["May_2025"];
        assert_eq!(stored.quantity, Some(0.0));
        assert_eq!(stored.market_value, None);
    }

    // ── Ordering ──────────────────────────────────────────────────────────────

    #[test]
    fn test_entries_keep_discovery_order() {
        let portfolio = fold_snapshots(vec![
            (
                Period::new("March_2025"),
                vec![record("ZZZ", "Z", 1.0, 1.0, 1.0), record("AAA", "A", 1.0, 1.0, 1.0)],
            ),
            (
                Period::new("January_2025"),
                vec![record("MMM", "M", 1.0, 1.0, 1.0), record("AAA", "A", 1.0, 1.0, 1.0)],
            ),
        ]);
        let ids: Vec<&str> = portfolio
            .entries()
            .iter()
            .map(|e| e.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["ZZZ", "AAA", "MMM"]);
    }

    #[test]
    fn test_periods_first_seen_and_chronological() {
        let mut portfolio = Portfolio::new();
        portfolio.observe_period(&Period::new("March_2025"));
        portfolio.observe_period(&Period::new("Feb_Bad"));
        portfolio.observe_period(&Period::new("January_2025"));
        portfolio.observe_period(&Period::new("March_2025"));

        let seen: Vec<&str> = portfolio.periods().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(seen, vec!["March_2025", "Feb_Bad", "January_2025"]);

        let ordered: Vec<String> = portfolio
            .ordered_periods()
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(ordered, vec!["January_2025", "March_2025", "Feb_Bad"]);
    }

    #[test]
    fn test_observed_period_without_records() {
        let portfolio = fold_snapshots(vec![(Period::new("April_2025"), Vec::new())]);
        assert!(portfolio.is_empty());
        assert_eq!(portfolio.periods().len(), 1);
    }

    // ── insert_entry ──────────────────────────────────────────────────────────

    #[test]
    fn test_insert_entry_replaces_in_place() {
        let mut portfolio = Portfolio::new();
        portfolio.insert_entry(PortfolioEntry {
            identifier: "A".into(),
            name: "first".into(),
            ..Default::default()
        });
        portfolio.insert_entry(PortfolioEntry {
            identifier: "B".into(),
            ..Default::default()
        });
        portfolio.insert_entry(PortfolioEntry {
            identifier: "A".into(),
            name: "second".into(),
            ..Default::default()
        });

        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio.entries()[0].name, "second");
    }
}
