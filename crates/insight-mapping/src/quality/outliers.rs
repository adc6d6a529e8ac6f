//! IQR and Z-score outlier detection.
//!
//! The two methods are computed independently and reported side by side;
//! neither result is adjusted to agree with the other.

use crate::stats::moments;
use crate::utils::{finite, percent, quantile_sorted, sorted_present};
use serde::{Deserialize, Serialize};

/// Outliers found with Tukey's fences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqrOutliers {
    /// Fence multiplier used (`k` in `Q1 - k*IQR`).
    pub multiplier: f64,
    pub q1: Option<f64>,
    pub q3: Option<f64>,
    pub iqr: Option<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    /// Row indices of flagged values, ascending.
    pub indices: Vec<usize>,
    pub count: usize,
    /// Share of non-null values flagged, 0-100.
    pub percent: f64,
}

/// Outliers found with population z-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreOutliers {
    /// Absolute z-score a value must exceed to be flagged.
    pub threshold: f64,
    pub mean: Option<f64>,
    /// Population standard deviation.
    pub std: Option<f64>,
    /// Row indices of flagged values, ascending.
    pub indices: Vec<usize>,
    pub count: usize,
    /// Share of non-null values flagged, 0-100.
    pub percent: f64,
    /// Set when the method could not flag anything (no values, zero variance).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Outlier diagnostics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnOutliers {
    pub column: String,
    pub non_null_count: usize,
    pub iqr: IqrOutliers,
    pub zscore: ZScoreOutliers,
}

impl ColumnOutliers {
    /// Mean of the IQR and Z-score outlier ratios, in [0, 1].
    pub fn combined_ratio(&self) -> f64 {
        (self.iqr.percent + self.zscore.percent) / 200.0
    }
}

/// Flag values outside `[Q1 - k*IQR, Q3 + k*IQR]`.
///
/// Quartiles use linear interpolation. A column without values has
/// undefined bounds and no outliers.
pub fn iqr_outliers(values: &[Option<f64>], multiplier: f64) -> IqrOutliers {
    let sorted = sorted_present(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);

    let (Some(q1), Some(q3)) = (q1, q3) else {
        return IqrOutliers {
            multiplier,
            q1: None,
            q3: None,
            iqr: None,
            lower_bound: None,
            upper_bound: None,
            indices: Vec::new(),
            count: 0,
            percent: 0.0,
        };
    };

    // A bound beyond the f64 range leaves that side open
    let iqr = finite(q3 - q1);
    let lower_bound = iqr.and_then(|iqr| finite(q1 - multiplier * iqr));
    let upper_bound = iqr.and_then(|iqr| finite(q3 + multiplier * iqr));
    let outside = |x: f64| {
        lower_bound.is_some_and(|low| x < low) || upper_bound.is_some_and(|high| x > high)
    };
    let indices: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| outside(*x)).map(|_| i))
        .collect();

    IqrOutliers {
        multiplier,
        q1: Some(q1),
        q3: Some(q3),
        iqr,
        lower_bound,
        upper_bound,
        count: indices.len(),
        percent: percent(indices.len(), sorted.len()),
        indices,
    }
}

/// Flag values with `|x - mean| / std > threshold`, using the population std.
///
/// Zero variance flags nothing rather than dividing by zero.
pub fn zscore_outliers(values: &[Option<f64>], threshold: f64) -> ZScoreOutliers {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let empty = |mean: Option<f64>, std: Option<f64>, note: &str| ZScoreOutliers {
        threshold,
        mean,
        std,
        indices: Vec::new(),
        count: 0,
        percent: 0.0,
        note: Some(note.to_string()),
    };

    if present.is_empty() {
        return empty(None, None, "no non-null values");
    }

    let mean = moments::mean(&present);
    let std = match moments::population_std(&present) {
        Some(std) if std > 0.0 => std,
        Some(_) => return empty(mean, Some(0.0), "zero variance, no z-score outliers"),
        None => return empty(mean, None, "spread exceeds the f64 range"),
    };
    let mean = mean.unwrap_or_default();

    let indices: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| (x / std - mean / std).abs() > threshold).map(|_| i))
        .collect();

    ZScoreOutliers {
        threshold,
        mean: Some(mean),
        std: Some(std),
        count: indices.len(),
        percent: percent(indices.len(), present.len()),
        indices,
        note: None,
    }
}
