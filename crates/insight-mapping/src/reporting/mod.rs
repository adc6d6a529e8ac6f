//! Report assembly and serialization.
//!
//! [`ReportAssembler`] merges the stage outputs into one immutable
//! [`Report`]. The report serializes to deterministic JSON
//! ([`Report::to_json`]) and to a navigable HTML document
//! ([`Report::to_html`]); [`ReportWriter`] writes both to disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use insight_mapping::reporting::{Report, ReportWriter};
//!
//! let written = ReportWriter::new("outputs").write(&report)?;
//! let parsed = Report::from_json(&std::fs::read_to_string(written.json)?)?;
//! assert_eq!(parsed, report);
//! ```

mod assembler;
mod html;
mod report;
mod writer;

pub use assembler::{ReportAssembler, StageOutputs};
pub use report::{
    ENGINE_NAME, ENGINE_VERSION, EngineInfo, REPORT_KEYS, Report, ReportMetadata, SCHEMA_VERSION,
    Section, SectionOutcome, SectionStatus, StageError,
};
pub use writer::{HTML_FILE_NAME, JSON_FILE_NAME, ReportWriter, WrittenReport};

/// Column- or pair-level problems a stage output carries without failing.
///
/// A section whose output reports any degradation is marked
/// [`SectionStatus::Degraded`] in the report metadata.
pub trait Diagnostics {
    fn degradations(&self) -> Vec<String>;
}
