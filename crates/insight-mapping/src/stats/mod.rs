//! Descriptive statistics.
//!
//! [`DescriptiveStatsEngine`] turns every column of a dataset view into a
//! [`ColumnProfile`], preserving column order. Statistics that cannot be
//! computed for a column (zero variance, too few values, all missing) are
//! reported as `null` and named in the profile's `warnings`.

mod engine;
pub mod moments;

pub use engine::DescriptiveStatsEngine;

use crate::dataset::ColumnKind;
use crate::reporting::Diagnostics;
use serde::{Deserialize, Serialize};

/// Summary of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; 0 for fewer than two values or a
    /// constant column. `None` only when it exceeds the f64 range.
    pub std: Option<f64>,
    /// `None` when it exceeds the f64 range.
    pub variance: Option<f64>,
    pub skewness: Option<f64>,
    /// Excess kurtosis.
    pub kurtosis: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: Option<f64>,
    pub zeros: usize,
    pub negatives: usize,
}

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFrequency {
    pub value: String,
    pub count: usize,
    /// Share of non-null rows, 0-100.
    pub percent: f64,
}

/// Summary of a categorical, boolean or text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    /// Most frequent categories, by descending count then value.
    pub top_values: Vec<CategoryFrequency>,
    pub mode: Option<String>,
    /// Non-null rows whose value is outside `top_values`.
    pub other_count: usize,
    /// Distinct non-null categories, including those beyond `top_values`.
    pub distinct_count: usize,
}

/// Range of a datetime column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimeSummary {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Per-column output of the statistics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Storage type as reported by polars.
    pub dtype: String,
    pub row_count: usize,
    pub non_null_count: usize,
    pub missing_count: usize,
    /// 0-100.
    pub missing_percent: f64,
    /// Distinct non-null values.
    pub unique_count: usize,
    pub memory_bytes: usize,
    pub sample_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorical: Option<CategoricalSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DatetimeSummary>,
    /// Statistics reported as undefined for this column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Output of the statistics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub profiles: Vec<ColumnProfile>,
    /// Sum of the per-column memory estimates.
    pub memory_bytes: usize,
}

impl Diagnostics for StatsReport {
    fn degradations(&self) -> Vec<String> {
        self.profiles
            .iter()
            .flat_map(|p| p.warnings.iter().map(move |w| format!("{}: {}", p.name, w)))
            .collect()
    }
}
