//! Progress events and cooperative cancellation.
//!
//! The analyzers run on rayon workers and report from there, so reporters
//! are `Send + Sync`. A [`CancellationToken`] is checked between stages and
//! once per correlation pair.
//!
//! ```rust,ignore
//! let token = CancellationToken::new();
//! let pipeline = AnalysisPipeline::builder()
//!     .cancellation_token(token.clone())
//!     .on_progress(|u| eprintln!("{:>3.0}% {}", u.progress * 100.0, u.message))
//!     .build()?;
//! // token.cancel() from any thread stops the run with AnalysisError::Cancelled
//! ```

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of an analysis run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Initializing,
    QualityAnalysis,
    DescriptiveStatistics,
    /// Pearson and Cramér's V matrices
    Correlation,
    Visualization,
    ReportAssembly,
    Complete,
    Cancelled,
    /// Aborted by a fatal error
    Failed,
}

impl AnalysisStage {
    /// Working stages whose weights add up to the whole run.
    pub const WORKING: [AnalysisStage; 6] = [
        Self::Initializing,
        Self::QualityAnalysis,
        Self::DescriptiveStatistics,
        Self::Correlation,
        Self::Visualization,
        Self::ReportAssembly,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::QualityAnalysis => "Analyzing Quality",
            Self::DescriptiveStatistics => "Computing Statistics",
            Self::Correlation => "Computing Correlations",
            Self::Visualization => "Planning Visualizations",
            Self::ReportAssembly => "Assembling Report",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run attributed to this stage.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.05,
            Self::QualityAnalysis => 0.25,
            Self::DescriptiveStatistics => 0.20,
            Self::Correlation => 0.30,
            Self::Visualization | Self::ReportAssembly => 0.10,
            Self::Complete | Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Overall progress when this stage starts: the weights of every
    /// working stage before it.
    fn offset(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Cancelled | Self::Failed => 0.0,
            _ => Self::WORKING
                .iter()
                .take_while(|stage| *stage != self)
                .map(|stage| stage.weight())
                .sum(),
        }
    }
}

/// One progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AnalysisStage,

    /// Which part of the stage is running, e.g. "numeric" for the Pearson matrix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress in [0, 1]
    pub progress: f32,

    /// Progress within `stage` in [0, 1]
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: AnalysisStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        Self {
            stage,
            sub_stage: None,
            progress: (stage.offset() + stage.weight() * stage_progress).clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
        }
    }

    pub fn with_sub_stage(
        stage: AnalysisStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::new(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, 1.0, message)
    }

    pub fn cancelled() -> Self {
        Self::new(AnalysisStage::Cancelled, 0.0, "Analysis cancelled by caller")
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, 0.0, message)
    }

    /// Whether no further updates follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.stage,
            AnalysisStage::Complete | AnalysisStage::Cancelled | AnalysisStage::Failed
        )
    }
}

/// Receives progress events. Called from worker threads; must not block.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>(F)
where
    F: Fn(ProgressUpdate) + Send + Sync;

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.0)(update);
    }
}

/// Shared cancellation flag. Clones observe the same flag; once cancelled
/// the pipeline returns [`AnalysisError::Cancelled`] and no report.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called on
    /// any clone.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // ========================================================================
    // Stage Tests
    // ========================================================================

    #[test]
    fn test_working_weights_cover_run() {
        let total: f32 = AnalysisStage::WORKING.iter().map(|s| s.weight()).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_offsets_follow_execution_order() {
        assert_eq!(AnalysisStage::Initializing.offset(), 0.0);
        assert!((AnalysisStage::Correlation.offset() - 0.5).abs() < 1e-6);
        assert!((AnalysisStage::ReportAssembly.offset() - 0.9).abs() < 1e-6);
        assert_eq!(AnalysisStage::Complete.offset(), 1.0);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AnalysisStage::DescriptiveStatistics).unwrap(),
            "\"descriptive_statistics\""
        );
    }

    // ========================================================================
    // Update Tests
    // ========================================================================

    #[test]
    fn test_update_progress_within_stage() {
        let update = ProgressUpdate::new(AnalysisStage::Correlation, 0.5, "pairs");
        assert!((update.progress - 0.65).abs() < 1e-6);
        assert!(!update.is_terminal());

        let clamped = ProgressUpdate::new(AnalysisStage::Visualization, 3.0, "over");
        assert_eq!(clamped.stage_progress, 1.0);
    }

    #[test]
    fn test_sub_stage_kept() {
        let update =
            ProgressUpdate::with_sub_stage(AnalysisStage::Correlation, "numeric", 1.0, "done");
        assert_eq!(update.sub_stage.as_deref(), Some("numeric"));
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sub_stage"], "numeric");

        let plain = serde_json::to_value(ProgressUpdate::new(AnalysisStage::Initializing, 0.0, ""))
            .unwrap();
        assert!(plain.get("sub_stage").is_none());
    }

    #[test]
    fn test_terminal_updates() {
        let done = ProgressUpdate::complete("ok");
        assert_eq!(done.progress, 1.0);
        assert!(done.is_terminal());

        let cancelled = ProgressUpdate::cancelled();
        assert_eq!(cancelled.stage, AnalysisStage::Cancelled);
        assert_eq!(cancelled.progress, 0.0);
        assert!(ProgressUpdate::failed("boom").is_terminal());
    }

    #[test]
    fn test_closure_reporter_receives_updates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ClosureProgressReporter::new(move |u: ProgressUpdate| {
            sink.lock().unwrap().push(u.stage);
        });

        reporter.report(ProgressUpdate::new(AnalysisStage::QualityAnalysis, 0.0, "start"));
        reporter.report(ProgressUpdate::complete("end"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![AnalysisStage::QualityAnalysis, AnalysisStage::Complete]
        );
    }

    // ========================================================================
    // Cancellation Tests
    // ========================================================================

    #[test]
    fn test_token_starts_clear() {
        assert!(CancellationToken::new().check().is_ok());
    }

    #[test]
    fn test_cancel_visible_to_clones_on_other_threads() {
        let token = CancellationToken::new();
        let observer = token.clone();

        std::thread::spawn(move || token.cancel()).join().unwrap();

        assert!(observer.is_cancelled());
        assert!(observer.check().unwrap_err().is_cancelled());
    }
}
