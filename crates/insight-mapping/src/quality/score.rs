//! Composite data quality score.

use crate::config::QualityWeights;
use serde::{Deserialize, Serialize};

/// Single 0-100 quality figure with the components it was built from.
///
/// Each component is a 0-100 "cleanliness" score:
///
/// - `completeness` = 100 * (1 - mean missing ratio over all columns)
/// - `uniqueness` = 100 * (1 - duplicate row ratio)
/// - `outlier_cleanliness` = 100 * (1 - mean outlier ratio over numeric
///   columns), where a column's outlier ratio is the mean of its IQR and
///   Z-score ratios
///
/// `score` is the weighted sum of the components, clipped to [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityScore {
    pub score: f64,
    pub completeness: f64,
    pub uniqueness: f64,
    pub outlier_cleanliness: f64,
    pub weights: QualityWeights,
}

/// Ratios feeding the score, each in [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityRatios {
    pub avg_missing: f64,
    pub duplicate_rows: f64,
    pub avg_outlier: f64,
}

impl DataQualityScore {
    pub fn compute(ratios: QualityRatios, weights: QualityWeights) -> Self {
        let completeness = component(ratios.avg_missing);
        let uniqueness = component(ratios.duplicate_rows);
        let outlier_cleanliness = component(ratios.avg_outlier);

        let score = weights.completeness * completeness
            + weights.uniqueness * uniqueness
            + weights.outliers * outlier_cleanliness;

        Self {
            score: score.clamp(0.0, 100.0),
            completeness,
            uniqueness,
            outlier_cleanliness,
            weights,
        }
    }
}

fn component(ratio: f64) -> f64 {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    (1.0 - ratio) * 100.0
}
