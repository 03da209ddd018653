//! Data ingestion layer for Holdings Timeline.
//!
//! Responsible for discovering and reading monthly disclosure snapshots,
//! extracting their listed-equity section, merging sections across periods
//! and running the top-level compile pipeline.

pub mod aggregator;
pub mod analysis;
pub mod extractor;
pub mod reader;

pub use holdings_core as core;
