//! Cleaning and quality diagnostics.
//!
//! [`QualityAnalyzer`] produces a [`QualityReport`] made of a missing-value
//! table, a duplicate report, per-column outlier diagnostics and a single
//! [`DataQualityScore`].

mod analyzer;
pub mod outliers;
pub mod score;

pub use analyzer::QualityAnalyzer;
pub use outliers::{ColumnOutliers, IqrOutliers, ZScoreOutliers, iqr_outliers, zscore_outliers};
pub use score::{DataQualityScore, QualityRatios};

use crate::reporting::Diagnostics;
use serde::{Deserialize, Serialize};

/// Missing values for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingColumn {
    pub column: String,
    pub missing_count: usize,
    pub non_null_count: usize,
    /// 0-100.
    pub missing_percent: f64,
}

/// Per-column and whole-table missingness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueTable {
    pub columns: Vec<MissingColumn>,
    pub total_missing_cells: usize,
    pub total_missing_percent: f64,
}

impl MissingValueTable {
    /// Mean missing ratio across columns, in [0, 1].
    pub fn average_ratio(&self) -> f64 {
        if self.columns.is_empty() {
            return 0.0;
        }
        self.columns.iter().map(|c| c.missing_percent / 100.0).sum::<f64>()
            / self.columns.len() as f64
    }
}

/// Two columns holding the same value sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateColumnPair {
    pub first: String,
    pub second: String,
}

/// Repeated values within one column (nulls count as a value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDuplicates {
    pub column: String,
    pub duplicate_values: usize,
}

/// Row- and column-level duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Rows that repeat an earlier row exactly.
    pub row_count: usize,
    /// `row_count` as a share of all rows, 0-100.
    pub percent: f64,
    pub total_rows: usize,
    pub unique_rows: usize,
    pub column_pairs: Vec<DuplicateColumnPair>,
    pub by_column: Vec<ColumnDuplicates>,
}

/// Outlier diagnostics for every numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub columns: Vec<ColumnOutliers>,
}

impl OutlierReport {
    /// Mean of the per-column combined outlier ratios, in [0, 1].
    pub fn average_ratio(&self) -> f64 {
        if self.columns.is_empty() {
            return 0.0;
        }
        self.columns.iter().map(|c| c.combined_ratio()).sum::<f64>() / self.columns.len() as f64
    }

    pub fn get(&self, column: &str) -> Option<&ColumnOutliers> {
        self.columns.iter().find(|c| c.column == column)
    }
}

/// Output of the quality analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub missing: MissingValueTable,
    pub duplicates: DuplicateReport,
    pub outliers: OutlierReport,
    pub score: DataQualityScore,
    /// Columns skipped or degraded during analysis.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostics for QualityReport {
    fn degradations(&self) -> Vec<String> {
        let mut notes = self.notes.clone();
        for column in &self.outliers.columns {
            if let Some(note) = &column.zscore.note {
                notes.push(format!("{}: {}", column.column, note));
            }
        }
        notes
    }
}
