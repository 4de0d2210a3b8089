//! Process command - extract fields from a single receipt image.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::ProgressBar;
use tracing::{debug, info};

use receipt_core::{ExtractionMode, ReceiptProcessor};

use super::{bar_style, format_result, is_supported_image, load_config, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input receipt image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Extraction mode (keyword or simple), overrides the config file
    #[arg(short, long)]
    mode: Option<ExtractionMode>,

    /// Print fields that fell back to their defaults
    #[arg(long)]
    show_warnings: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path, args.mode)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_supported_image(&args.input) {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(bar_style(
        "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}",
        "##-",
    )?);

    pb.set_message("Loading recognizer...");
    pb.set_position(10);
    let processor = ReceiptProcessor::from_config(&config)?;
    debug!(
        "Using {} recognizer in {} mode",
        processor.recognizer().name(),
        processor.parser().mode()
    );

    pb.set_message("Reading image...");
    pb.set_position(30);
    let bytes = fs::read(&args.input)?;

    pb.set_message("Running OCR...");
    pb.set_position(50);
    let result = processor.process_bytes(&bytes)?;

    pb.set_position(100);
    pb.finish_and_clear();

    if args.show_warnings && !result.warnings.is_empty() {
        eprintln!("{}", style("Extraction warnings:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!(
        "Extraction took {}ms, total {:?}",
        result.processing_time_ms,
        start.elapsed()
    );

    Ok(())
}
