//! Cellwise - evaluate spreadsheet formulas over CSV sheets

mod config;

use anyhow::{Context, Result};
use cellwise_core::storage::{render_csv, render_markdown};
use cellwise_core::Document;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{ExportFormat, load_config};

/// Evaluate a sheet of raw cell text and print the displayed values.
#[derive(Parser)]
#[command(name = "cellwise", version, about, long_about = None)]
struct Cli {
    /// Sheet to open (CSV of raw cell text, formulas start with `=`)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Evaluate a formula against the sheet and print the result
    #[arg(short = 'c', long = "command", value_name = "FORMULA", allow_hyphen_values = true)]
    command: Option<String>,

    /// Print the displayed value of a single cell (e.g. B3)
    #[arg(long, value_name = "LABEL")]
    cell: Option<String>,

    /// Export evaluated values (.csv for CSV, otherwise markdown)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Config file to use instead of the user config dir
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    config: Option<PathBuf>,

    /// Ignore any config file
    #[arg(long)]
    no_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = if cli.no_config {
        config::Config::default()
    } else {
        let (config, warnings) = load_config(cli.config.as_deref());
        for warning in warnings {
            eprintln!("Warning: {}", warning);
        }
        config
    };
    debug!(?config, "configuration loaded");

    let doc = match &cli.file {
        Some(path) => Document::load_csv(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Document::new(config.sheet.rows, config.sheet.cols),
    };

    if let Some(formula) = &cli.command {
        let value = doc.evaluate_formula(formula);
        println!("{}", value);
        return Ok(if value.is_error() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    if let Some(label) = &cli.cell {
        let cell_ref = Document::cell_ref(label)?;
        println!("{}", doc.display(&cell_ref));
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(path) = &cli.output {
        let exported = match config.export.format.for_path(path) {
            ExportFormat::Csv => doc.export_csv(path),
            ExportFormat::Markdown => doc.export_markdown(path),
        };
        exported.with_context(|| format!("Failed to export to {}", path.display()))?;
        println!("Exported to {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    match config.export.format {
        ExportFormat::Csv => print!("{}", render_csv(&doc)),
        ExportFormat::Markdown => print!("{}", render_markdown(&doc)),
    }
    Ok(ExitCode::SUCCESS)
}
