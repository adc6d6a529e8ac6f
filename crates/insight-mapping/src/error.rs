//! Error types for the analysis pipeline.
//!
//! Errors fall into three groups:
//!
//! - **Fatal** errors abort the run and no report is produced (dataset
//!   contract violations, cancellation, invalid configuration).
//! - **Stage** errors are caught by the pipeline and recorded in the report
//!   metadata; the affected section is omitted.
//! - Column-level degradations are never errors. They are encoded in the
//!   analyzers' outputs as explicit "undefined" values.
//!
//! Errors are serializable so a failed stage can be embedded in the report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Pipeline was cancelled by the caller.
    #[error("Analysis cancelled")]
    Cancelled,

    /// Columns handed to the dataset view do not share one row count.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    /// The same column name appears more than once.
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A column has an empty name.
    #[error("Column at position {0} has an empty name")]
    EmptyColumnName(usize),

    /// A column override named a column the view does not have.
    #[error("No column named '{0}' in the dataset")]
    ColumnNotFound(String),

    /// Configuration rejected by validation.
    #[error("Configuration rejected: {0}")]
    InvalidConfig(String),

    /// A whole analyzer stage failed.
    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    /// Input file has a format the loader cannot read.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// A serialized report was written with an incompatible schema.
    #[error("Report schema version {found} is not compatible with {expected}")]
    SchemaVersionMismatch { expected: String, found: String },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A frame operation failed inside polars.
    #[error("Dataframe operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Report (de)serialization failed.
    #[error("Report JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    /// Any of the above, with a note on what was being done.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a stage failure.
    pub fn stage_failed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::StageFailed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::RaggedColumns { .. } => "RAGGED_COLUMNS",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::EmptyColumnName(_) => "EMPTY_COLUMN_NAME",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::StageFailed { .. } => "STAGE_FAILED",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::SchemaVersionMismatch { .. } => "SCHEMA_VERSION_MISMATCH",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Check if this error must abort the whole run.
    ///
    /// Fatal errors are contract violations by the caller or loader; the
    /// pipeline propagates them instead of recording a failed section.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Cancelled
            | Self::RaggedColumns { .. }
            | Self::DuplicateColumn(_)
            | Self::EmptyColumnName(_)
            | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
