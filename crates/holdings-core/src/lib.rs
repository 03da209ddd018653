//! Core types for the holdings timeline.
//!
//! Cell/row model, canonical fields and per-period metrics, the header
//! normaliser, period labelling, error type, CLI settings and display
//! helpers shared by the data and report crates.

pub mod error;
pub mod formatting;
pub mod header;
pub mod models;
pub mod period;
pub mod settings;

pub use error::{HoldingsError, Result};
