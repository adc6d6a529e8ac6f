use super::Diagnostics;
use super::report::{
    EngineInfo, Report, ReportMetadata, SCHEMA_VERSION, Section, SectionOutcome, SectionStatus,
};
use crate::correlation::CorrelationMatrix;
use crate::dataset::DatasetView;
use crate::error::Result;
use crate::quality::QualityReport;
use crate::stats::StatsReport;
use crate::visualization::VisualizationPlan;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Per-stage results handed to the assembler.
///
/// A stage error here is a stage-level failure: the section is omitted and
/// recorded as failed, the rest of the report is still built.
pub struct StageOutputs {
    pub quality: Result<QualityReport>,
    pub stats: Result<StatsReport>,
    pub correlation_numeric: Result<CorrelationMatrix>,
    pub correlation_categorical: Result<CorrelationMatrix>,
    pub visualizations: Result<VisualizationPlan>,
}

/// Merges stage outputs into one [`Report`].
#[derive(Debug, Default)]
pub struct ReportAssembler {
    generated_at: Option<DateTime<Utc>>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the generation timestamp instead of reading the clock.
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn assemble(&self, view: &DatasetView, outputs: StageOutputs) -> Report {
        let mut sections = Vec::with_capacity(Section::ALL.len());

        let column_profiles = take_section(Section::ColumnProfiles, outputs.stats, &mut sections)
            .map(|stats| stats.profiles);
        let quality = take_section(Section::Quality, outputs.quality, &mut sections);
        let correlation_numeric = take_section(
            Section::CorrelationNumeric,
            outputs.correlation_numeric,
            &mut sections,
        );
        let correlation_categorical = take_section(
            Section::CorrelationCategorical,
            outputs.correlation_categorical,
            &mut sections,
        );
        let visualizations =
            take_section(Section::Visualizations, outputs.visualizations, &mut sections)
                .map(|plan| plan.specs);

        let complete = sections.iter().all(|s| s.status != SectionStatus::Failed);
        if complete {
            info!("Report assembled for '{}'", view.name());
        } else {
            warn!(
                "Report for '{}' is partial: {} section(s) failed",
                view.name(),
                sections
                    .iter()
                    .filter(|s| s.status == SectionStatus::Failed)
                    .count()
            );
        }

        let mut column_kinds = BTreeMap::new();
        for kind in view.kinds() {
            *column_kinds.entry(*kind).or_insert(0) += 1;
        }

        let metadata = ReportMetadata {
            dataset_name: view.name().to_string(),
            row_count: view.height(),
            column_count: view.width(),
            memory_bytes: view.memory_bytes(),
            loaded_at: view.loaded_at(),
            generated_at: self.generated_at.unwrap_or_else(Utc::now),
            engine: EngineInfo::default(),
            column_kinds,
            sections,
            complete,
        };

        Report {
            metadata,
            column_profiles,
            quality,
            correlation_numeric,
            correlation_categorical,
            visualizations,
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }
}

fn take_section<T: Diagnostics>(
    section: Section,
    result: Result<T>,
    outcomes: &mut Vec<SectionOutcome>,
) -> Option<T> {
    match result {
        Ok(value) => {
            outcomes.push(SectionOutcome::succeeded(section, value.degradations()));
            Some(value)
        }
        Err(e) => {
            warn!("Section '{}' omitted: {}", section, e);
            outcomes.push(SectionOutcome::failed(section, &e));
            None
        }
    }
}
