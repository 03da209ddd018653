use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the holdings timeline crates.
#[derive(Error, Debug)]
pub enum HoldingsError {
    /// No row in the snapshot carries both an identifier and a quantity header.
    #[error("No header row with ISIN and Quantity columns in {0}")]
    HeaderNotFound(PathBuf),

    /// A header was found but the equity section yielded no holdings.
    #[error("No holdings captured from the listed equity section of {0}")]
    EmptySection(PathBuf),

    /// A period label is not of the form `<MonthName>_<Year>`.
    #[error("Malformed period label: {0}")]
    MalformedPeriodLabel(String),

    /// A metric cell could not be read as a number.
    #[error("Unparseable numeric value: {0}")]
    UnparseableNumeric(String),

    /// The input folder contains no spreadsheet files at all.
    #[error("No spreadsheet files found in {0}")]
    NoInputFiles(PathBuf),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet container could not be decoded.
    #[error("Failed to decode spreadsheet {path}: {reason}")]
    Spreadsheet { path: PathBuf, reason: String },

    /// The report could not be written to its destination.
    #[error("Failed to write report {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    /// A cell grid does not have the shape of a consolidated report.
    #[error("Malformed report: {0}")]
    MalformedReport(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HoldingsError {
    /// Per-file problems that skip the file but let the run continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HoldingsError::HeaderNotFound(_)
                | HoldingsError::EmptySection(_)
                | HoldingsError::MalformedPeriodLabel(_)
                | HoldingsError::UnparseableNumeric(_)
                | HoldingsError::FileRead { .. }
                | HoldingsError::Spreadsheet { .. }
        )
    }
}

/// Convenience alias used throughout the holdings crates.
pub type Result<T> = std::result::Result<T, HoldingsError>;
