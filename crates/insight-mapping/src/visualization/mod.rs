//! Renderer-agnostic chart specifications.
//!
//! The generator is a pure function of the dataset view and the analyzer
//! outputs; it never draws or writes anything. Turning a spec into an
//! artifact is the job of an [`ArtifactRenderer`] supplied by the caller.

mod generator;

pub use generator::{AnalysisOutputs, VisualizationGenerator, sturges_bins};

use crate::correlation::CorrelationMethod;
use crate::reporting::Diagnostics;
use crate::stats::CategoryFrequency;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Label used for categories lumped together beyond the bar chart limit.
pub const OTHER_LABEL: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    Box,
    Violin,
    Bar,
    Pairplot,
    Heatmap,
    Scatter,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Histogram => "histogram",
            Self::Box => "box",
            Self::Violin => "violin",
            Self::Bar => "bar",
            Self::Pairplot => "pairplot",
            Self::Heatmap => "heatmap",
            Self::Scatter => "scatter",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering parameters. Only the fields relevant to the chart kind are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kde: Option<bool>,
    /// IQR multiplier used for the whiskers of box plots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whisker_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryFrequency>,
    /// Distinct categories folded into `other_label`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lumped_categories: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<CorrelationMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub interactive: bool,
}

/// One chart to be produced by an external renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationSpec {
    /// Stable identifier, e.g. `histogram:age` or `scatter:height:weight`.
    pub id: String,
    pub kind: ChartKind,
    pub title: String,
    pub columns: Vec<String>,
    pub params: ChartParams,
    /// Reference returned by the renderer, when one ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

impl VisualizationSpec {
    pub fn new(kind: ChartKind, columns: Vec<String>, title: impl Into<String>) -> Self {
        let id = std::iter::once(kind.as_str().to_string())
            .chain(columns.iter().cloned())
            .collect::<Vec<_>>()
            .join(":");
        Self {
            id,
            kind,
            title: title.into(),
            columns,
            params: ChartParams::default(),
            artifact: None,
        }
    }

    pub fn with_params(mut self, params: ChartParams) -> Self {
        self.params = params;
        self
    }

    /// Replace the id, used for charts that are not keyed by columns.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Ordered specs plus notes on charts that were skipped or failed to render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPlan {
    pub specs: Vec<VisualizationSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl VisualizationPlan {
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn of_kind(&self, kind: ChartKind) -> impl Iterator<Item = &VisualizationSpec> {
        self.specs.iter().filter(move |s| s.kind == kind)
    }

    /// Hand every spec to `renderer`, storing the returned reference.
    ///
    /// A failed render leaves the spec without an artifact and adds a note.
    pub fn render_with(&mut self, renderer: &dyn ArtifactRenderer) {
        for spec in &mut self.specs {
            match renderer.render(spec) {
                Ok(reference) => spec.artifact = Some(reference),
                Err(e) => {
                    warn!("Rendering '{}' failed: {:#}", spec.id, e);
                    self.notes.push(format!("{}: render failed: {:#}", spec.id, e));
                }
            }
        }
    }
}

impl Diagnostics for VisualizationPlan {
    fn degradations(&self) -> Vec<String> {
        self.notes.clone()
    }
}

/// Turns a chart spec into an artifact reference (a path, URL or id).
pub trait ArtifactRenderer: Send + Sync {
    fn render(&self, spec: &VisualizationSpec) -> anyhow::Result<String>;
}
