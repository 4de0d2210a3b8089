//! Extract command - run field extraction over recognized text, no OCR.

use std::fs;
use std::io::Read;
use std::path::Path;

use clap::Args;
use console::style;
use tracing::info;

use receipt_core::{ExtractionMode, ExtractionResult, RawText, ReceiptParser};

use super::{format_result, load_config, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Text file holding recognizer output, or "-" for stdin
    #[arg(required = true)]
    input: String,

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

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path, args.mode)?;

    let text = read_input(&args.input)?;
    let result = extract(&text, config.extraction.mode);

    if args.show_warnings {
        for warning in &result.warnings {
            eprintln!("{} {}", style("!").yellow(), warning);
        }
    }

    println!("{}", format_result(&result, args.format)?);
    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    let path = Path::new(input);
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(fs::read_to_string(path)?)
}

fn extract(text: &str, mode: ExtractionMode) -> ExtractionResult {
    info!("Extracting fields from {} characters in {} mode", text.len(), mode);
    ReceiptParser::new().with_mode(mode).parse(&RawText::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.txt");
        fs::write(&path, "ACME STORE\nTotal: 12.00\n").unwrap();

        let text = read_input(path.to_str().unwrap()).unwrap();
        let result = extract(&text, ExtractionMode::Keyword);

        assert_eq!(result.fields.vendor_name, "ACME STORE");
        assert_eq!(result.fields.total_amount.to_string(), "12.00");
        assert_eq!(result.warnings, vec!["Could not extract date".to_string()]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_input("/definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }

    #[test]
    fn test_simple_mode_collects_items() {
        let result = extract("Bakery\nRoll 0.80\nTotal: 0.80", ExtractionMode::Simple);
        assert_eq!(result.fields.vendor_name, "BAKERY");
        assert_eq!(result.fields.items, vec!["Bakery", "Roll 0.80"]);
    }
}
