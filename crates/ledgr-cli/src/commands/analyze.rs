//! Analyze command - normalize and analyze a single statement.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use tracing::{debug, info};

use ledgr_core::models::config::{Granularity, LedgrConfig};
use ledgr_core::{
    parse_candidate_document, Locale, PdfExtractor, ProcessingMetadata, SourceDocument,
    StatementEngine, StatementReport, TextSource,
};

pub use super::output::OutputFormat;
use super::output::format_report;

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (PDF, plain text, or extractor JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip locale detection
    #[arg(long, value_enum)]
    locale: Option<LocaleArg>,

    /// Bucket by month name only, merging years
    #[arg(long)]
    month_only: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LocaleArg {
    /// English (Latin script)
    En,
    /// Arabic
    Ar,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::En => Locale::English,
            LocaleArg::Ar => Locale::Arabic,
        }
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut LedgrConfig, locale: Option<LocaleArg>, month_only: bool) {
    if let Some(locale) = locale {
        config.locale.force = Some(locale.into());
    }
    if month_only {
        config.analytics.granularity = Granularity::MonthOnly;
    }
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, args.locale, args.month_only);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Analyzing file: {}", args.input.display());
    let report = analyze_file(&args.input, &config)?;

    let output = format_report(&report, args.format, args.pretty)?;

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

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the engine over one input file, dispatching on its extension.
pub fn analyze_file(path: &Path, config: &LedgrConfig) -> anyhow::Result<StatementReport> {
    let start = Instant::now();
    let processed_at = Local::now().naive_local();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let source = path.display().to_string();
    let engine = StatementEngine::new(config.clone());

    let (report, pages, records) = match extension.as_str() {
        "json" => {
            let text = fs::read_to_string(path)?;
            let document = parse_candidate_document(&text);
            let records = document.rows.len();
            debug!("Parsed {} candidate rows from {}", records, source);
            (engine.process_candidates(document), 1, records)
        }
        "txt" | "text" => {
            let text = fs::read_to_string(path)?;
            let document = SourceDocument::new(&source, text);
            let report = engine.process_document(&engine.default_selector(), &document);
            let records = report.total_transactions;
            (report, 1, records)
        }
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor = PdfExtractor::new();
            let document = extractor.read_document(&source, &data)?;
            debug!("PDF has {} pages", document.pages);

            if document.text.trim().is_empty() {
                anyhow::bail!("No text could be extracted from the PDF");
            }

            let report = engine.process_document(&engine.default_selector(), &document);
            let records = report.total_transactions;
            (report, document.pages, records)
        }
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    let metadata = ProcessingMetadata {
        source: Some(source),
        processed_at: Some(processed_at),
        pages_processed: pages,
        records_processed: records,
        processing_time_ms: Some(start.elapsed().as_millis() as u64),
    };

    Ok(report.with_metadata(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_overrides() {
        let mut config = LedgrConfig::default();
        apply_overrides(&mut config, Some(LocaleArg::Ar), true);

        assert_eq!(config.locale.force, Some(Locale::Arabic));
        assert_eq!(config.analytics.granularity, Granularity::MonthOnly);

        let mut config = LedgrConfig::default();
        apply_overrides(&mut config, None, false);
        assert_eq!(config.locale.force, None);
        assert_eq!(config.analytics.granularity, Granularity::YearMonth);
    }

    #[test]
    fn test_analyze_json_attaches_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.json");
        fs::write(
            &path,
            r#"```json
{"account_holder_name": "JANE DOE", "transactions": [
  {"Date": "05/01/2024", "Description": "Salary", "Credit": "1,000.00", "Balance": "1,000.00"},
  {"Date": "20/01/2024", "Description": "Rent", "Debit": "400.00", "Balance": "600.00"}
]}
```"#,
        )
        .unwrap();

        let report = analyze_file(&path, &LedgrConfig::default()).unwrap();

        assert_eq!(report.account_info.customer_name, "JANE DOE");
        assert_eq!(report.total_transactions, 2);
        assert_eq!(report.metadata.records_processed, 2);
        assert_eq!(report.metadata.pages_processed, 1);
        assert_eq!(report.metadata.source, Some(path.display().to_string()));
        assert!(report.metadata.processed_at.is_some());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("statement.docx");
        fs::write(&path, "irrelevant").unwrap();

        let err = analyze_file(&path, &LedgrConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }
}
