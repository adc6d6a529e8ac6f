use crate::correlation::CorrelationMatrix;
use crate::dataset::ColumnKind;
use crate::error::{AnalysisError, Result};
use crate::quality::QualityReport;
use crate::stats::ColumnProfile;
use crate::visualization::VisualizationSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Version of the serialized report layout.
///
/// Readers accept any report with the same major version.
pub const SCHEMA_VERSION: &str = "1.0.0";

pub const ENGINE_NAME: &str = env!("CARGO_PKG_NAME");
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level keys every serialized report carries.
pub const REPORT_KEYS: [&str; 7] = [
    "metadata",
    "column_profiles",
    "quality",
    "correlation_numeric",
    "correlation_categorical",
    "visualizations",
    "schema_version",
];

/// Report sections produced by the analysis stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    ColumnProfiles,
    Quality,
    CorrelationNumeric,
    CorrelationCategorical,
    Visualizations,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::ColumnProfiles,
        Section::Quality,
        Section::CorrelationNumeric,
        Section::CorrelationCategorical,
        Section::Visualizations,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::ColumnProfiles => "column_profiles",
            Self::Quality => "quality",
            Self::CorrelationNumeric => "correlation_numeric",
            Self::CorrelationCategorical => "correlation_categorical",
            Self::Visualizations => "visualizations",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ColumnProfiles => "Descriptive statistics",
            Self::Quality => "Data quality",
            Self::CorrelationNumeric => "Numeric correlation",
            Self::CorrelationCategorical => "Categorical association",
            Self::Visualizations => "Visualizations",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    /// Every value in the section was computed.
    Complete,
    /// The section is present but some columns or pairs are undefined or skipped.
    Degraded,
    /// The stage failed; the section is omitted.
    Failed,
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Complete => "complete",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Serialized form of a stage failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub code: String,
    pub message: String,
}

impl From<&AnalysisError> for StageError {
    fn from(err: &AnalysisError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// What happened to one section during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutcome {
    pub section: Section,
    pub status: SectionStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StageError>,
}

impl SectionOutcome {
    /// Complete when there are no notes, degraded otherwise.
    pub fn succeeded(section: Section, notes: Vec<String>) -> Self {
        let status = if notes.is_empty() {
            SectionStatus::Complete
        } else {
            SectionStatus::Degraded
        };
        Self {
            section,
            status,
            notes,
            error: None,
        }
    }

    pub fn failed(section: Section, error: &AnalysisError) -> Self {
        Self {
            section,
            status: SectionStatus::Failed,
            notes: Vec::new(),
            error: Some(StageError::from(error)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
}

impl Default for EngineInfo {
    fn default() -> Self {
        Self {
            name: ENGINE_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Dataset facts and the per-section run outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub dataset_name: String,
    pub row_count: usize,
    pub column_count: usize,
    /// Estimated in-memory size of the dataset, in bytes.
    pub memory_bytes: usize,
    pub loaded_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub engine: EngineInfo,
    pub column_kinds: BTreeMap<ColumnKind, usize>,
    pub sections: Vec<SectionOutcome>,
    /// False when any section failed and was omitted.
    pub complete: bool,
}

/// The canonical analysis result.
///
/// Built once by [`ReportAssembler`](super::ReportAssembler). JSON and HTML
/// output are projections of this value; nothing is computed while
/// serializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub column_profiles: Option<Vec<ColumnProfile>>,
    pub quality: Option<QualityReport>,
    pub correlation_numeric: Option<CorrelationMatrix>,
    pub correlation_categorical: Option<CorrelationMatrix>,
    pub visualizations: Option<Vec<VisualizationSpec>>,
    pub schema_version: String,
}

impl Report {
    pub fn is_complete(&self) -> bool {
        self.metadata.complete
    }

    pub fn section(&self, section: Section) -> Option<&SectionOutcome> {
        self.metadata.sections.iter().find(|s| s.section == section)
    }

    /// Sections recorded as failed.
    pub fn failed_sections(&self) -> Vec<Section> {
        self.metadata
            .sections
            .iter()
            .filter(|s| s.status == SectionStatus::Failed)
            .map(|s| s.section)
            .collect()
    }

    /// Pretty-printed JSON. Serializing the same report twice gives identical bytes.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a serialized report.
    ///
    /// Unknown fields are ignored. Every top-level key must be present (an
    /// omitted section is `null`, not absent) and the schema major version
    /// must match [`SCHEMA_VERSION`].
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or_else(|| {
            AnalysisError::Json(<serde_json::Error as serde::de::Error>::custom(
                "report must be a JSON object",
            ))
        })?;

        for key in REPORT_KEYS {
            if !object.contains_key(key) {
                return Err(AnalysisError::Json(
                    <serde_json::Error as serde::de::Error>::missing_field(key),
                ));
            }
        }

        let found = object
            .get("schema_version")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if major_version(found) != major_version(SCHEMA_VERSION) {
            return Err(AnalysisError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION.to_string(),
                found: found.to_string(),
            });
        }

        Ok(serde_json::from_value(value)?)
    }
}

fn major_version(version: &str) -> Option<u64> {
    version.split('.').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_report() -> Report {
        let at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Report {
            metadata: ReportMetadata {
                dataset_name: "empty".to_string(),
                row_count: 0,
                column_count: 0,
                memory_bytes: 0,
                loaded_at: at,
                generated_at: at,
                engine: EngineInfo::default(),
                column_kinds: BTreeMap::new(),
                sections: vec![SectionOutcome::failed(
                    Section::Quality,
                    &AnalysisError::stage_failed("quality", "boom"),
                )],
                complete: false,
            },
            column_profiles: Some(Vec::new()),
            quality: None,
            correlation_numeric: None,
            correlation_categorical: None,
            visualizations: Some(Vec::new()),
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    #[test]
    fn test_top_level_keys() {
        let json = minimal_report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for key in REPORT_KEYS {
            assert!(keys.contains(&key), "missing key {}", key);
        }
        assert_eq!(keys.len(), REPORT_KEYS.len());
        assert!(value["quality"].is_null());
    }

    #[test]
    fn test_stage_error_is_embedded() {
        let json = minimal_report().to_json().unwrap();
        assert!(json.contains("\"code\": \"STAGE_FAILED\""));
        assert!(json.contains("\"status\": \"failed\""));
    }

    #[test]
    fn test_from_json_tolerates_unknown_fields() {
        let mut value: serde_json::Value =
            serde_json::from_str(&minimal_report().to_json().unwrap()).unwrap();
        value["future_section"] = serde_json::json!({"anything": [1, 2, 3]});
        value["metadata"]["new_field"] = serde_json::json!(true);

        let parsed = Report::from_json(&value.to_string()).unwrap();
        assert_eq!(parsed, minimal_report());
    }

    #[test]
    fn test_from_json_rejects_missing_key() {
        let mut value: serde_json::Value =
            serde_json::from_str(&minimal_report().to_json().unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("quality");

        let err = Report::from_json(&value.to_string()).unwrap_err();
        assert_eq!(err.error_code(), "JSON_ERROR");
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn test_from_json_rejects_major_version() {
        let mut report = minimal_report();
        report.schema_version = "2.0.0".to_string();
        let err = Report::from_json(&report.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaVersionMismatch { .. }));

        report.schema_version = "1.4.2".to_string();
        assert!(Report::from_json(&report.to_json().unwrap()).is_ok());
    }

    #[test]
    fn test_failed_sections() {
        let report = minimal_report();
        assert!(!report.is_complete());
        assert_eq!(report.failed_sections(), vec![Section::Quality]);
        assert_eq!(
            report.section(Section::Quality).unwrap().status,
            SectionStatus::Failed
        );
    }
}
