//! The analysis pipeline and its builder.
//!
//! Quality, statistics and the two correlation matrices depend only on the
//! read-only dataset view, so they run as four rayon tasks. Visualization
//! generation and report assembly wait for all of them.

use crate::config::AnalysisConfig;
use crate::correlation::{CorrelationEngine, CorrelationMatrix, CorrelationMethod};
use crate::dataset::DatasetView;
use crate::error::Result;
use crate::pipeline::progress::{
    AnalysisStage, CancellationToken, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::quality::{QualityAnalyzer, QualityReport};
use crate::reporting::{Report, ReportAssembler, StageOutputs};
use crate::stats::{DescriptiveStatsEngine, StatsReport};
use crate::visualization::{AnalysisOutputs, ArtifactRenderer, VisualizationGenerator};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Runs every analysis stage over a dataset view and assembles the report.
///
/// Use [`AnalysisPipeline::builder()`] to configure it.
///
/// # Example
///
/// ```rust,ignore
/// use insight_mapping::{AnalysisConfig, AnalysisPipeline, CancellationToken};
///
/// let token = CancellationToken::new();
/// let report = AnalysisPipeline::builder()
///     .config(AnalysisConfig::builder().top_k_categories(5).build()?)
///     .cancellation_token(token.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run(&view)?;
///
/// if !report.is_complete() {
///     eprintln!("failed sections: {:?}", report.failed_sections());
/// }
/// ```
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
    artifact_renderer: Option<Arc<dyn ArtifactRenderer>>,
}

// Runs on a background thread in the CLI and in embedding applications
static_assertions::assert_impl_all!(AnalysisPipeline: Send, Sync);

impl AnalysisPipeline {
    pub fn builder() -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `view` and return the assembled report.
    ///
    /// A stage that fails with a recoverable error is recorded as failed in
    /// the report metadata and its section is omitted.
    ///
    /// # Errors
    ///
    /// Returns `Err(AnalysisError::Cancelled)` if the token was cancelled, and
    /// any other fatal error (see [`AnalysisError::is_fatal`]) raised by a
    /// stage. No partial report is produced in those cases.
    ///
    /// [`AnalysisError::is_fatal`]: crate::error::AnalysisError::is_fatal
    pub fn run(&self, view: &DatasetView) -> Result<Report> {
        match self.run_internal(view) {
            Ok(report) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed"));
                Ok(report)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Analysis error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, view: &DatasetView) -> Result<Report> {
        let start = Instant::now();
        info!(
            "Starting analysis of '{}' ({} rows x {} columns)",
            view.name(),
            view.height(),
            view.width()
        );
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Initializing,
            0.0,
            "Starting analysis...",
        ));
        self.cancellation_token.check()?;

        let ((quality, stats), (numeric, categorical)) = rayon::join(
            || rayon::join(|| self.quality_stage(view), || self.stats_stage(view)),
            || {
                rayon::join(
                    || self.correlation_stage(view, CorrelationMethod::Pearson),
                    || self.correlation_stage(view, CorrelationMethod::CramersV),
                )
            },
        );

        // Join point: fatal errors abort, anything else becomes a failed section
        let quality = escalate(quality)?;
        let stats = escalate(stats)?;
        let numeric = escalate(numeric)?;
        let categorical = escalate(categorical)?;
        self.cancellation_token.check()?;

        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Visualization,
            0.0,
            "Generating chart specifications...",
        ));
        let mut plan = VisualizationGenerator::new(self.config.clone()).generate(
            view,
            AnalysisOutputs {
                quality: quality.as_ref().ok(),
                stats: stats.as_ref().ok(),
                numeric: numeric.as_ref().ok(),
                categorical: categorical.as_ref().ok(),
            },
        );
        if let Some(renderer) = &self.artifact_renderer {
            plan.render_with(renderer.as_ref());
        }
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::Visualization,
            1.0,
            format!("{} chart specifications", plan.len()),
        ));
        self.cancellation_token.check()?;

        self.report_progress(ProgressUpdate::new(
            AnalysisStage::ReportAssembly,
            0.0,
            "Assembling report...",
        ));
        let report = ReportAssembler::new().assemble(
            view,
            StageOutputs {
                quality,
                stats,
                correlation_numeric: numeric,
                correlation_categorical: categorical,
                visualizations: Ok(plan),
            },
        );

        info!(
            "Analysis finished in {:.2}s (complete: {})",
            start.elapsed().as_secs_f64(),
            report.is_complete()
        );
        Ok(report)
    }

    fn quality_stage(&self, view: &DatasetView) -> Result<QualityReport> {
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::QualityAnalysis,
            0.0,
            "Analyzing data quality...",
        ));
        let result = QualityAnalyzer::new(self.config.clone())
            .with_cancellation(self.cancellation_token.clone())
            .analyze(view)
            .map_err(|e| e.with_context("Quality analysis"));
        if let Ok(report) = &result {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::QualityAnalysis,
                1.0,
                format!("Quality score {:.1}", report.score.score),
            ));
        }
        result
    }

    fn stats_stage(&self, view: &DatasetView) -> Result<StatsReport> {
        self.report_progress(ProgressUpdate::new(
            AnalysisStage::DescriptiveStatistics,
            0.0,
            "Profiling columns...",
        ));
        let result = DescriptiveStatsEngine::new(self.config.clone())
            .with_cancellation(self.cancellation_token.clone())
            .analyze(view)
            .map_err(|e| e.with_context("Descriptive statistics"));
        if let Ok(report) = &result {
            self.report_progress(ProgressUpdate::new(
                AnalysisStage::DescriptiveStatistics,
                1.0,
                format!("Profiled {} columns", report.profiles.len()),
            ));
        }
        result
    }

    fn correlation_stage(
        &self,
        view: &DatasetView,
        method: CorrelationMethod,
    ) -> Result<CorrelationMatrix> {
        let scope = method.scope();
        self.report_progress(ProgressUpdate::with_sub_stage(
            AnalysisStage::Correlation,
            scope,
            0.0,
            format!("Computing {} correlation...", method),
        ));
        let engine = CorrelationEngine::new().with_cancellation(self.cancellation_token.clone());
        let matrix = match method {
            CorrelationMethod::Pearson => engine.numeric_matrix(view),
            CorrelationMethod::CramersV => engine.categorical_matrix(view),
        };
        let result = matrix.map_err(|e| e.with_context(format!("{} correlation", method)));

        if let Ok(matrix) = &result {
            self.report_progress(ProgressUpdate::with_sub_stage(
                AnalysisStage::Correlation,
                scope,
                1.0,
                format!("{} x {} {} matrix", matrix.len(), matrix.len(), matrix.method),
            ));
        }
        result
    }
}

/// Separate fatal errors from recoverable stage failures.
fn escalate<T>(result: Result<T>) -> Result<Result<T>> {
    match result {
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Stage failed, continuing with a partial report: {}", e);
            Ok(Err(e))
        }
        Ok(value) => Ok(Ok(value)),
    }
}

/// Builder for [`AnalysisPipeline`].
#[derive(Default)]
pub struct AnalysisPipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
    artifact_renderer: Option<Arc<dyn ArtifactRenderer>>,
}

static_assertions::assert_impl_all!(AnalysisPipelineBuilder: Send);

impl AnalysisPipelineBuilder {
    /// Set the analysis configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during analysis.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// The closure is called from rayon worker threads while the analyzers
    /// run in parallel.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    ///
    /// Clone the token and call [`CancellationToken::cancel()`] from any
    /// thread. Stages check it between columns and correlation pairs.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Turn each chart spec into an artifact reference stored in the report.
    pub fn artifact_renderer(mut self, renderer: Arc<dyn ArtifactRenderer>) -> Self {
        self.artifact_renderer = Some(renderer);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<AnalysisPipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(AnalysisPipeline {
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            artifact_renderer: self.artifact_renderer,
        })
    }
}
