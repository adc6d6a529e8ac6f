//! CLI entry point for the EDA pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use insight_mapping::dataset::loader::load_dataset;
use insight_mapping::{
    AnalysisConfig, AnalysisPipeline, ArtifactRenderer, DatasetView, ProfilerRegistry, Report,
    ReportWriter, SectionStatus, VisualizationSpec,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory data analysis reports for tabular files",
    long_about = "Analyzes a CSV, TSV, JSON, JSON Lines or Parquet file and writes a \
                  versioned JSON report, an HTML report and chart specifications.\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  insight-mapping data.csv\n\n  \
                  # Custom output directory and extended profile\n  \
                  insight-mapping data.csv -o results/ --profile\n\n  \
                  # Print the JSON report to stdout only\n  \
                  insight-mapping data.parquet --json"
)]
struct Args {
    /// Path to the dataset file
    input: PathBuf,

    /// Output directory for reports and chart specs
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Also run the extended profilers
    #[arg(short, long)]
    profile: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the JSON report to stdout (disables logging)
    #[arg(long)]
    json: bool,

    /// Categories kept in each frequency table
    #[arg(long)]
    top_k: Option<usize>,

    /// Z-score threshold for outliers
    #[arg(long)]
    zscore_threshold: Option<f64>,

    /// IQR multiplier for outlier bounds
    #[arg(long)]
    iqr_multiplier: Option<f64>,

    /// Maximum numeric columns in the pairplot
    #[arg(long)]
    pairplot_max_columns: Option<usize>,

    /// Absolute Pearson coefficient above which a scatter spec is emitted
    #[arg(long)]
    correlation_threshold: Option<f64>,

    /// Do not write chart spec files
    #[arg(long)]
    no_visuals: bool,
}

/// Writes each chart spec as JSON under `<output>/visuals/` for an external chart tool.
struct SpecFileRenderer {
    output_dir: PathBuf,
}

impl SpecFileRenderer {
    const DIR_NAME: &'static str = "visuals";

    fn new(output_dir: &Path) -> Result<Self> {
        let visuals = output_dir.join(Self::DIR_NAME);
        fs::create_dir_all(&visuals)
            .with_context(|| format!("Creating {}", visuals.display()))?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }
}

impl ArtifactRenderer for SpecFileRenderer {
    fn render(&self, spec: &VisualizationSpec) -> Result<String> {
        let file_name: String = spec
            .id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let relative = format!("{}/{}.json", Self::DIR_NAME, file_name);
        let path = self.output_dir.join(&relative);
        fs::write(&path, serde_json::to_string_pretty(spec)?)
            .with_context(|| format!("Writing {}", path.display()))?;
        Ok(relative)
    }
}

fn init_logging(level: &str, verbose: bool, quiet: bool, json_output: bool) {
    // stdout carries only the JSON report
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        level
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder();
    if let Some(k) = args.top_k {
        builder = builder.top_k_categories(k);
    }
    if let Some(z) = args.zscore_threshold {
        builder = builder.zscore_threshold(z);
    }
    if let Some(m) = args.iqr_multiplier {
        builder = builder.iqr_multiplier(m);
    }
    if let Some(n) = args.pairplot_max_columns {
        builder = builder.pairplot_max_columns(n);
    }
    if let Some(t) = args.correlation_threshold {
        builder = builder.high_correlation_threshold(t);
    }
    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.verbose, args.quiet, args.json);

    let config = build_config(&args)?;

    info!("Loading dataset from: {}", args.input.display());
    let (df, format) = load_dataset(&args.input)?;
    info!("Dataset loaded ({:?}): {:?}", format, df.shape());

    let name = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();
    let view = DatasetView::from_dataframe(df, &config)?.with_name(name);

    let threshold = config.high_correlation_threshold;
    let mut builder = AnalysisPipeline::builder().config(config);
    if !args.no_visuals {
        builder = builder.artifact_renderer(Arc::new(SpecFileRenderer::new(&args.output)?));
    }
    if !args.json && !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    let report = builder.build()?.run(&view).map_err(|e| {
        error!("Analysis failed: {}", e);
        anyhow!("Analysis failed: {}", e)
    })?;

    let written = ReportWriter::new(&args.output).write(&report)?;

    let extended = if args.profile {
        ProfilerRegistry::with_defaults().run_all(&view, &args.output)
    } else {
        Vec::new()
    };

    if !report.is_complete() {
        warn!("Report is partial: {:?} failed", report.failed_sections());
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    print_summary(&report, threshold, &written.json, &written.html, &extended);
    Ok(())
}

/// Print a short human-readable summary.
///
/// Uses `println!` because this is the command's primary output, shown
/// regardless of the log level.
fn print_summary(
    report: &Report,
    threshold: f64,
    json_path: &Path,
    html_path: &Path,
    extended: &[PathBuf],
) {
    let meta = &report.metadata;

    println!("\n{}", "=".repeat(80));
    println!("EDA REPORT: {}", meta.dataset_name);
    println!("{}\n", "=".repeat(80));

    println!("DATASET");
    println!("{}", "-".repeat(40));
    println!("  Rows: {}", meta.row_count);
    println!("  Columns: {}", meta.column_count);
    println!("  Memory: {:.1} KiB", meta.memory_bytes as f64 / 1024.0);
    for (kind, count) in &meta.column_kinds {
        println!("  {}: {}", kind, count);
    }
    println!();

    if let Some(quality) = &report.quality {
        println!("DATA QUALITY");
        println!("{}", "-".repeat(40));
        println!("  Score: {:.1} / 100", quality.score.score);
        println!(
            "  Missing cells: {} ({:.2}%)",
            quality.missing.total_missing_cells, quality.missing.total_missing_percent
        );
        println!(
            "  Duplicate rows: {} ({:.2}%)",
            quality.duplicates.row_count, quality.duplicates.percent
        );
        for pair in &quality.duplicates.column_pairs {
            println!("  Duplicate columns: {} = {}", pair.first, pair.second);
        }
        println!();
    }

    if let Some(matrix) = &report.correlation_numeric {
        let strong = matrix.strong_pairs(threshold);
        if !strong.is_empty() {
            println!("STRONG CORRELATIONS");
            println!("{}", "-".repeat(40));
            for pair in strong {
                if let Some(value) = pair.coefficient.value() {
                    println!("  {} ~ {}: {:+.3}", pair.first, pair.second, value);
                }
            }
            println!();
        }
    }

    println!("SECTIONS");
    println!("{}", "-".repeat(40));
    for outcome in &meta.sections {
        let detail = match (&outcome.error, outcome.status) {
            (Some(e), _) => format!(" ({})", e.message),
            (None, SectionStatus::Degraded) => format!(" ({} notes)", outcome.notes.len()),
            _ => String::new(),
        };
        println!("  {:<26} {}{}", outcome.section.title(), outcome.status, detail);
    }
    println!();

    println!("OUTPUT FILES");
    println!("{}", "-".repeat(40));
    println!("  - {}", json_path.display());
    println!("  - {}", html_path.display());
    for path in extended {
        println!("  - {}", path.display());
    }
    println!("{}", "=".repeat(80));
}
