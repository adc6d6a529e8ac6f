//! Exploratory Data Analysis Pipeline Library
//!
//! Turns a tabular dataset into a structured, reproducible EDA report built
//! on Polars.
//!
//! # Overview
//!
//! - **Data Quality**: missing values, duplicate rows and columns, IQR and
//!   Z-score outliers, and a single 0-100 quality score
//! - **Descriptive Statistics**: one [`ColumnProfile`] per column
//! - **Correlation**: Pearson over numeric columns and bias-corrected
//!   Cramér's V over categorical columns, with explicit undefined entries
//! - **Visualization Specs**: renderer-agnostic chart descriptions
//! - **Reports**: a versioned [`Report`] with deterministic JSON and HTML
//!   projections, including partial reports when a stage fails
//! - **Progress Reporting**: progress updates with cancellation support
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use insight_mapping::{AnalysisConfig, AnalysisPipeline, DatasetView, ReportWriter};
//! use insight_mapping::dataset::loader::load_dataset;
//!
//! let (df, _format) = load_dataset("data.csv")?;
//! let config = AnalysisConfig::builder()
//!     .zscore_threshold(3.5)
//!     .top_k_categories(5)
//!     .build()?;
//!
//! let view = DatasetView::from_dataframe(df, &config)?.with_name("data");
//! let report = AnalysisPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run(&view)?;
//!
//! ReportWriter::new("outputs").write(&report)?;
//! ```
//!
//! # Configuration
//!
//! [`AnalysisConfig`] is passed explicitly to every analyzer, so pipelines
//! with different settings can run side by side.
//!
//! # Error Handling
//!
//! Fatal errors ([`AnalysisError::is_fatal`]) abort the run without a report.
//! A stage that fails for any other reason is recorded in the report
//! metadata and its section is omitted; column-level problems are encoded
//! in the stage outputs and never fail a run.

pub mod config;
pub mod correlation;
pub mod dataset;
pub mod error;
pub mod extensions;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod stats;
pub mod utils;
pub mod visualization;

pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError, QualityWeights};
pub use correlation::{
    Coefficient, CorrelationEngine, CorrelationMatrix, CorrelationMethod, UndefinedReason,
};
pub use dataset::{ColumnKind, DatasetView};
pub use error::{AnalysisError, Result, ResultExt};
pub use extensions::{ExtendedProfiler, ProfilerRegistry, SummaryTableProfiler};
pub use pipeline::{
    AnalysisPipeline, AnalysisPipelineBuilder, AnalysisStage, CancellationToken,
    ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
pub use quality::{DataQualityScore, QualityAnalyzer, QualityReport};
pub use reporting::{
    Diagnostics, Report, ReportAssembler, ReportWriter, SCHEMA_VERSION, Section, SectionStatus,
};
pub use stats::{ColumnProfile, DescriptiveStatsEngine, StatsReport};
pub use visualization::{
    ArtifactRenderer, ChartKind, VisualizationGenerator, VisualizationPlan, VisualizationSpec,
};
