//! Batch command for multiple statement files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use ledgr_core::StatementReport;

use super::analyze::{analyze_file, apply_overrides, LocaleArg, OutputFormat};
use super::output::format_report;

const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "text", "json"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Skip locale detection
    #[arg(long, value_enum)]
    locale: Option<LocaleArg>,

    /// Bucket by month name only, merging years
    #[arg(long)]
    month_only: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    index: usize,
    path: PathBuf,
    report: Option<StatementReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, args.locale, args.month_only);
    let config = Arc::new(config);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let config = Arc::clone(&config);
        let pb = overall_pb.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let result = analyze_file(&path, &config);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            pb.inc(1);

            match result {
                Ok(report) => FileOutcome {
                    index,
                    path,
                    report: Some(report),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => FileOutcome {
                    index,
                    path,
                    report: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            }
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|r| r.index);

    overall_pb.finish_with_message("Complete");

    for result in &results {
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }
    }

    let successful: Vec<_> = results.iter().filter(|r| r.report.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        let paths: Vec<&Path> = successful.iter().map(|r| r.path.as_path()).collect();
        let names = output_names(&paths, args.format);

        for (result, name) in successful.iter().zip(names) {
            if let Some(report) = &result.report {
                let output_path = output_dir.join(name);
                fs::write(&output_path, format_report(report, args.format, false)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Output file names for `paths`, one per input. Inputs sharing a stem keep
/// their source extension; names still clashing get the input position.
fn output_names(paths: &[&Path], format: OutputFormat) -> Vec<String> {
    fn count<'a>(names: impl Iterator<Item = &'a String>) -> HashMap<&'a str, usize> {
        let mut counts = HashMap::new();
        for name in names {
            *counts.entry(name.as_str()).or_insert(0) += 1;
        }
        counts
    }

    let stems: Vec<String> = paths
        .iter()
        .map(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("statement")
                .to_string()
        })
        .collect();
    let stem_counts = count(stems.iter());

    let bases: Vec<String> = paths
        .iter()
        .zip(&stems)
        .map(|(path, stem)| match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if stem_counts[stem.as_str()] > 1 => format!("{}.{}", stem, ext),
            _ => stem.clone(),
        })
        .collect();
    let base_counts = count(bases.iter());

    bases
        .iter()
        .enumerate()
        .map(|(i, base)| {
            if base_counts[base.as_str()] > 1 {
                warn!("Output name {} is ambiguous, numbering it", base);
                format!("{}-{}.{}", base, i + 1, format.extension())
            } else {
                format!("{}.{}", base, format.extension())
            }
        })
        .collect()
}

fn write_summary(path: &Path, results: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "locale",
        "strategy",
        "transactions",
        "months",
        "total_inflow",
        "total_outflow",
        "stability",
        "overdrafts",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(report) = &result.report {
            let analytics = &report.analytics;
            wtr.write_record([
                filename,
                "success",
                report.locale.code(),
                report.strategy.as_deref().unwrap_or(""),
                &report.total_transactions.to_string(),
                &report.monthly_analysis.len().to_string(),
                &format!("{:.2}", analytics.sum_total_inflow),
                &format!("{:.2}", analytics.sum_total_outflow),
                &format!("{:.4}", analytics.net_cash_flow_stability),
                &analytics.overdraft_frequency.to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
