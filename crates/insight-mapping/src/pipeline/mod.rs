//! Pipeline module.
//!
//! This module provides the analysis pipeline, its builder, and progress and
//! cancellation support.

mod builder;
pub mod progress;

pub use builder::{AnalysisPipeline, AnalysisPipelineBuilder};
pub use progress::{
    AnalysisStage, CancellationToken, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
