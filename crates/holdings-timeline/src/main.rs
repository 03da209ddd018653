mod bootstrap;

use anyhow::{Context, Result};
use holdings_core::formatting::format_value;
use holdings_core::models::Metric;
use holdings_core::settings::Settings;
use holdings_data::analysis::{compile_holdings, CompileOptions, CompileResult};
use holdings_report::{load_dataset, write_report, ReportMatrix};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Holdings Timeline v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Mode: {}, Output: {}",
        settings.mode,
        settings.output.display()
    );

    match settings.mode.as_str() {
        "compile" => run_compile(&settings),
        "dump" => run_dump(&settings),
        unknown => anyhow::bail!("Unknown mode: {}", unknown),
    }
}

fn run_compile(settings: &Settings) -> Result<()> {
    let input_dir = settings.require_input_dir()?;
    tracing::info!("Compiling snapshots from {}", input_dir.display());

    let options = CompileOptions {
        sheet: settings.sheet.clone(),
        exclude: Some(settings.output.clone()),
    };
    let result = compile_holdings(input_dir, &options)
        .with_context(|| format!("compiling snapshots in {}", input_dir.display()))?;

    let matrix = ReportMatrix::assemble(&result.portfolio, &settings.title);
    write_report(&matrix, &settings.output)?;

    print_summary(settings, &result, &matrix);
    Ok(())
}

fn run_dump(settings: &Settings) -> Result<()> {
    let dataset = load_dataset(&settings.output)
        .with_context(|| format!("reading report {}", settings.output.display()))?;
    println!("{}", dataset.to_json(settings.pretty)?);
    Ok(())
}

fn print_summary(settings: &Settings, result: &CompileResult, matrix: &ReportMatrix) {
    let meta = &result.metadata;
    println!(
        "Wrote {} holdings across {} periods to {}",
        meta.holdings,
        meta.periods,
        settings.output.display()
    );
    println!(
        "Files: {} found, {} merged, {} skipped",
        meta.files_discovered, meta.files_merged, meta.files_skipped
    );

    for period in &matrix.periods {
        let totals: Vec<String> = Metric::ALL
            .iter()
            .map(|&metric| {
                let value = matrix.total(period, metric).unwrap_or(0.0);
                format!("{} {}", metric.header(), format_value(metric.value_kind(), value))
            })
            .collect();
        println!("  {:<16} {}", period, totals.join(" | "));
    }

    if !result.skipped.is_empty() {
        println!("Skipped files:");
        for skipped in &result.skipped {
            println!("  {}: {}", skipped.path.display(), skipped.reason);
        }
    }
}
