//! Report layer for Holdings Timeline.
//!
//! Pivots a merged portfolio into the tiered report matrix, writes it as a
//! workbook or CSV file, and reads written reports back into the consumer
//! dataset.

pub mod dataset;
pub mod loader;
pub mod matrix;
pub mod writer;

pub use dataset::{load_dataset, HoldingsDataset};
pub use matrix::ReportMatrix;
pub use writer::write_report;
