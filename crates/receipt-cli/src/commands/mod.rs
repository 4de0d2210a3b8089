//! CLI subcommands and the output helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod process;

use std::path::{Path, PathBuf};

use indicatif::ProgressStyle;
use receipt_core::{ExtractionMode, ExtractionResult, ReceiptConfig, ReceiptFields};

/// Output format for extracted fields.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension used when writing one result per file.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Load `--config` if given, else the user config file if present, else defaults.
///
/// A `--mode` flag wins over whatever the file says.
pub fn load_config(
    config_path: Option<&str>,
    mode: Option<ExtractionMode>,
) -> anyhow::Result<ReceiptConfig> {
    let mut config = match config_path {
        Some(path) => ReceiptConfig::from_file(Path::new(path))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                ReceiptConfig::from_file(&default_path)?
            } else {
                ReceiptConfig::default()
            }
        }
    };

    if let Some(mode) = mode {
        config.extraction.mode = mode;
    }

    Ok(config)
}

/// True for file extensions the image decoder understands.
pub fn is_supported_image(path: &Path) -> bool {
    image::ImageFormat::from_path(path)
        .map(|format| format.can_read())
        .unwrap_or(false)
}

/// Render one extraction result in the requested format.
pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&result.fields)?),
        OutputFormat::Csv => format_csv(&result.fields),
        OutputFormat::Text => Ok(format_text(&result.fields)),
    }
}

pub fn format_csv(fields: &ReceiptFields) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["vendor_name", "date", "total_amount", "items"])?;
    wtr.write_record([
        fields.vendor_name.as_str(),
        fields.date.as_str(),
        &fields.total_amount.to_string(),
        &fields.items.join("; "),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(fields: &ReceiptFields) -> String {
    let mut output = String::new();

    output.push_str(&format!("Vendor: {}\n", fields.vendor_name));
    output.push_str(&format!("Date:   {}\n", fields.date));
    output.push_str(&format!("Total:  {:.2}\n", fields.total_amount));

    if !fields.items.is_empty() {
        output.push_str("\nItems:\n");
        for item in &fields.items {
            output.push_str(&format!("  - {}\n", item));
        }
    }

    output
}

/// Bar style shared by the single-file and batch commands.
pub fn bar_style(template: &str, chars: &str) -> anyhow::Result<ProgressStyle> {
    Ok(ProgressStyle::with_template(template)?.progress_chars(chars))
}

/// `<dir>/<stem>.<ext>` for a processed input file.
pub fn output_path_for(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("receipt");
    output_dir.join(format!("{}.{}", stem, format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use receipt_core::{RawText, ReceiptParser};

    fn parsed(text: &str, mode: ExtractionMode) -> ExtractionResult {
        ReceiptParser::new().with_mode(mode).parse(&RawText::new(text))
    }

    #[test]
    fn test_format_csv() {
        let result = parsed(
            "ACME STORE\nDate: 01/02/2023\nTotal: 3.50",
            ExtractionMode::Keyword,
        );
        let csv = format_csv(&result.fields).unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("vendor_name,date,total_amount,items"));
        assert_eq!(lines.next(), Some("ACME STORE,2023-01-02,3.50,"));
    }

    #[test]
    fn test_format_text_lists_items() {
        let result = parsed(
            "Corner Shop\nMilk 1.20\nBread 2.30\nTotal: 3.50",
            ExtractionMode::Simple,
        );
        let text = format_text(&result.fields);

        assert!(text.starts_with("Vendor: CORNER SHOP\n"));
        assert!(text.contains("Total:  3.50\n"));
        assert!(text.contains("  - Milk 1.20\n"));
    }

    #[test]
    fn test_supported_image_extensions() {
        assert!(is_supported_image(Path::new("scan.PNG")));
        assert!(is_supported_image(Path::new("photo.jpeg")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    #[test]
    fn test_output_path_for() {
        let path = output_path_for(
            Path::new("in/receipt_01.png"),
            Path::new("out"),
            OutputFormat::Text,
        );
        assert_eq!(path, PathBuf::from("out/receipt_01.txt"));
    }

    #[test]
    fn test_mode_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"extraction": {"mode": "keyword"}}"#).unwrap();

        let config = load_config(path.to_str(), Some(ExtractionMode::Simple)).unwrap();
        assert_eq!(config.extraction.mode, ExtractionMode::Simple);
    }
}
