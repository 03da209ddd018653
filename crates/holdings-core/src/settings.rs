use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{HoldingsError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Consolidate monthly holdings disclosures into one time-series report
#[derive(Parser, Debug, Clone)]
#[command(
    name = "holdings-timeline",
    about = "Consolidate monthly holdings disclosures into one time-series report",
    version
)]
pub struct Settings {
    /// Run mode: build the report, or dump an existing report as JSON
    #[arg(long, default_value = "compile", value_parser = ["compile", "dump"])]
    pub mode: String,

    /// Folder holding one spreadsheet per month, named <MonthName>_<Year>
    #[arg(long, env = "HOLDINGS_INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Report path (.xlsx or .csv); read back in dump mode
    #[arg(long, default_value = "holdings_timeline.xlsx")]
    pub output: PathBuf,

    /// Title written in the report's first row
    #[arg(long, default_value = "Equity Holdings")]
    pub title: String,

    /// Worksheet to read from each snapshot (first sheet if not given)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Pretty-print JSON in dump mode
    #[arg(long)]
    pub pretty: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.holdings-timeline/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl LastUsedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".holdings-timeline").join("last_used.json")
    }

    /// Load persisted params; `Default` when absent or unreadable.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Temp file then rename.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit args and
    /// config path, so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; clap stores arg ids by field name.
        if !is_arg_explicitly_set(&matches, "input_dir") && settings.input_dir.is_none() {
            settings.input_dir = last.input_dir;
        }
        if !is_arg_explicitly_set(&matches, "output") {
            if let Some(v) = last.output {
                settings.output = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "title") {
            if let Some(v) = last.title {
                settings.title = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "sheet") && settings.sheet.is_none() {
            settings.sheet = last.sheet;
        }

        settings = Self::apply_debug(settings);

        // Dump mode only reads; it does not rewrite the persisted defaults.
        if settings.mode == "compile" {
            let params = LastUsedParams::from(&settings);
            if let Err(e) = params.save_to(config_path) {
                tracing::debug!("Could not persist last-used parameters: {}", e);
            }
        }

        settings
    }

    /// Input folder, required in compile mode.
    pub fn require_input_dir(&self) -> Result<&std::path::Path> {
        self.input_dir.as_deref().ok_or_else(|| {
            HoldingsError::Config(
                "no input folder given; pass --input-dir or set HOLDINGS_INPUT_DIR".to_string(),
            )
        })
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            input_dir: s.input_dir.clone(),
            output: Some(s.output.clone()),
            title: Some(s.title.clone()),
            sheet: s.sheet.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
