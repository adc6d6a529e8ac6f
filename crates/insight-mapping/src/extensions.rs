//! Optional extended profiling.
//!
//! Extended profilers produce extra artifacts next to the report. They run
//! after the pipeline, never receive the [`Report`](crate::reporting::Report)
//! and cannot change it; an unavailable or failing profiler is skipped.

use crate::dataset::DatasetView;
use anyhow::Context;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A capability that can add artifacts beyond the canonical report.
pub trait ExtendedProfiler: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the profiler can run in this environment.
    fn is_available(&self) -> bool;

    /// Write the artifact into `output_dir` and return its path.
    fn generate(&self, view: &DatasetView, output_dir: &Path) -> anyhow::Result<PathBuf>;
}

/// Profilers queried and invoked opportunistically after a run.
#[derive(Default)]
pub struct ProfilerRegistry {
    profilers: Vec<Arc<dyn ExtendedProfiler>>,
}

impl ProfilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the profilers shipped with this crate.
    pub fn with_defaults() -> Self {
        Self::new().register(Arc::new(SummaryTableProfiler))
    }

    pub fn register(mut self, profiler: Arc<dyn ExtendedProfiler>) -> Self {
        self.profilers.push(profiler);
        self
    }

    /// Names of the profilers that report themselves available.
    pub fn available(&self) -> Vec<&str> {
        self.profilers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.name())
            .collect()
    }

    /// Run every available profiler, returning the artifacts that were written.
    pub fn run_all(&self, view: &DatasetView, output_dir: &Path) -> Vec<PathBuf> {
        let mut artifacts = Vec::new();
        for profiler in &self.profilers {
            if !profiler.is_available() {
                debug!("Extended profiler '{}' unavailable, skipping", profiler.name());
                continue;
            }
            match profiler.generate(view, output_dir) {
                Ok(path) => {
                    info!("Extended profile '{}' written: {}", profiler.name(), path.display());
                    artifacts.push(path);
                }
                Err(e) => warn!("Extended profiler '{}' failed: {:#}", profiler.name(), e),
            }
        }
        artifacts
    }
}

/// Writes a per-column summary table as `extended_profile.csv`.
pub struct SummaryTableProfiler;

impl SummaryTableProfiler {
    pub const FILE_NAME: &'static str = "extended_profile.csv";

    fn summary_frame(view: &DatasetView) -> PolarsResult<DataFrame> {
        let mut names = Vec::with_capacity(view.width());
        let mut kinds = Vec::with_capacity(view.width());
        let mut dtypes = Vec::with_capacity(view.width());
        let mut non_null = Vec::with_capacity(view.width());
        let mut missing = Vec::with_capacity(view.width());
        let mut unique = Vec::with_capacity(view.width());
        let mut memory = Vec::with_capacity(view.width());

        for column in view.columns() {
            let nulls = column.null_count();
            names.push(column.name.to_string());
            kinds.push(column.kind.as_str().to_string());
            dtypes.push(column.series.dtype().to_string());
            non_null.push((column.series.len() - nulls) as u64);
            missing.push(nulls as u64);
            unique.push(column.series.drop_nulls().n_unique()? as u64);
            memory.push(column.memory_bytes() as u64);
        }

        df![
            "column" => names,
            "kind" => kinds,
            "dtype" => dtypes,
            "non_null" => non_null,
            "missing" => missing,
            "unique" => unique,
            "memory_bytes" => memory,
        ]
    }
}

impl ExtendedProfiler for SummaryTableProfiler {
    fn name(&self) -> &str {
        "summary-table"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn generate(&self, view: &DatasetView, output_dir: &Path) -> anyhow::Result<PathBuf> {
        let mut table = Self::summary_frame(view).context("Building summary table")?;

        fs::create_dir_all(output_dir)
            .with_context(|| format!("Creating {}", output_dir.display()))?;
        let path = output_dir.join(Self::FILE_NAME);
        let mut file =
            File::create(&path).with_context(|| format!("Creating {}", path.display()))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut table)?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    struct Unavailable;

    impl ExtendedProfiler for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        fn is_available(&self) -> bool {
            false
        }

        fn generate(&self, _view: &DatasetView, _output_dir: &Path) -> anyhow::Result<PathBuf> {
            anyhow::bail!("should not be called")
        }
    }

    struct Broken;

    impl ExtendedProfiler for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn generate(&self, _view: &DatasetView, _output_dir: &Path) -> anyhow::Result<PathBuf> {
            anyhow::bail!("backend crashed")
        }
    }

    fn view() -> DatasetView {
        let df = df![
            "x" => [Some(1.0f64), None, Some(3.0)],
            "label" => ["a", "b", "a"],
        ]
        .unwrap();
        DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("insight_mapping_{}_{}", name, std::process::id()))
    }

    #[test]
    fn test_summary_table_written() {
        let dir = scratch_dir("summary_table");
        let path = SummaryTableProfiler.generate(&view(), &dir).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("column,kind,dtype,non_null,missing,unique,memory_bytes")
        );
        assert!(lines.next().unwrap().starts_with("x,numeric,f64,2,1,2,"));
        assert!(lines.next().unwrap().starts_with("label,categorical,str,3,0,2,"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_registry_skips_unavailable_and_failing() {
        let dir = scratch_dir("registry");
        let registry = ProfilerRegistry::with_defaults()
            .register(Arc::new(Unavailable))
            .register(Arc::new(Broken));

        assert_eq!(registry.available(), vec!["summary-table", "broken"]);
        let artifacts = registry.run_all(&view(), &dir);
        assert_eq!(artifacts, vec![dir.join(SummaryTableProfiler::FILE_NAME)]);

        fs::remove_dir_all(&dir).ok();
    }
}
