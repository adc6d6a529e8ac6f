use super::report::Report;
use crate::error::{AnalysisError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const JSON_FILE_NAME: &str = "report.json";
pub const HTML_FILE_NAME: &str = "report.html";

/// Paths of the files written for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub json: PathBuf,
    pub html: PathBuf,
}

/// Writes `report.json` and `report.html` into an output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write(&self, report: &Report) -> Result<WrittenReport> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            AnalysisError::Io(e).with_context(format!(
                "Creating output directory {}",
                self.output_dir.display()
            ))
        })?;

        let json = self.output_dir.join(JSON_FILE_NAME);
        fs::write(&json, report.to_json()?)?;
        info!("Report saved: {}", json.display());

        let html = self.output_dir.join(HTML_FILE_NAME);
        fs::write(&html, report.to_html())?;
        info!("Report saved: {}", html.display());

        Ok(WrittenReport { json, html })
    }
}
