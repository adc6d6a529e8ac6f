//! Configuration for the analysis pipeline.
//!
//! [`AnalysisConfig`] is an explicit value handed to every analyzer when it
//! is constructed. Two pipelines with different settings can run side by
//! side without interfering with each other.

use serde::{Deserialize, Serialize};

/// Strings treated as missing values, compared case-insensitively after trimming.
pub const DEFAULT_MISSING_SENTINELS: &[&str] =
    &["", "na", "n/a", "nan", "null", "none", "#n/a", "missing"];

/// Weights used to combine the three quality components into one score.
///
/// The score is
/// `100 * (completeness * (1 - avg missing ratio)
///       + uniqueness * (1 - duplicate row ratio)
///       + outliers * (1 - avg outlier ratio))`,
/// where the outlier ratio of a numeric column is the mean of its IQR and
/// Z-score outlier ratios. Weights must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub completeness: f64,
    pub uniqueness: f64,
    pub outliers: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.4,
            uniqueness: 0.3,
            outliers: 0.3,
        }
    }
}

impl QualityWeights {
    pub fn sum(&self) -> f64 {
        self.completeness + self.uniqueness + self.outliers
    }
}

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use insight_mapping::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .zscore_threshold(2.5)
///     .top_k_categories(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Values normalized to null when the dataset view is built.
    /// Default: "", "na", "n/a", "nan", "null", "none", "#n/a", "missing"
    pub missing_sentinels: Vec<String>,

    /// Multiplier applied to the IQR for the outlier fences.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Absolute z-score above which a value is an outlier.
    /// Default: 3.0
    pub zscore_threshold: f64,

    /// Number of categories kept in a column profile's frequency table.
    /// Default: 10
    pub top_k_categories: usize,

    /// Number of bars in a bar chart before the rest is lumped as "other".
    /// Default: 20
    pub bar_chart_top_n: usize,

    /// Largest number of numeric columns a pairplot may cover.
    /// Default: 8
    pub pairplot_max_columns: usize,

    /// Absolute Pearson coefficient above which a pair gets a scatter chart.
    /// Default: 0.7
    pub high_correlation_threshold: f64,

    /// Fixed histogram bin count. `None` applies Sturges' rule per column.
    /// Default: None
    pub histogram_bins: Option<usize>,

    /// Whether histogram specs request a KDE overlay.
    /// Default: true
    pub kde: bool,

    /// Number of sample values captured per column profile.
    /// Default: 5
    pub sample_size: usize,

    /// Weights of the quality score components.
    pub quality_weights: QualityWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            missing_sentinels: DEFAULT_MISSING_SENTINELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            iqr_multiplier: 1.5,
            zscore_threshold: 3.0,
            top_k_categories: 10,
            bar_chart_top_n: 20,
            pairplot_max_columns: 8,
            high_correlation_threshold: 0.7,
            histogram_bins: None,
            kde: true,
            sample_size: 5,
            quality_weights: QualityWeights::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Check whether a raw string value is a missing-value sentinel.
    pub fn is_missing_sentinel(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.missing_sentinels
            .iter()
            .any(|sentinel| sentinel.trim().eq_ignore_ascii_case(trimmed))
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "iqr_multiplier".to_string(),
                value: self.iqr_multiplier,
            });
        }
        if !self.zscore_threshold.is_finite() || self.zscore_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "zscore_threshold".to_string(),
                value: self.zscore_threshold,
            });
        }
        if !(0.0..=1.0).contains(&self.high_correlation_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "high_correlation_threshold".to_string(),
                value: self.high_correlation_threshold,
            });
        }
        for (field, value) in [
            ("top_k_categories", self.top_k_categories),
            ("bar_chart_top_n", self.bar_chart_top_n),
            ("pairplot_max_columns", self.pairplot_max_columns),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::InvalidLimit {
                    field: field.to_string(),
                    value,
                });
            }
        }
        if self.histogram_bins == Some(0) {
            return Err(ConfigValidationError::InvalidLimit {
                field: "histogram_bins".to_string(),
                value: 0,
            });
        }

        let weights = &self.quality_weights;
        if weights.completeness < 0.0 || weights.uniqueness < 0.0 || weights.outliers < 0.0 {
            return Err(ConfigValidationError::InvalidWeights(weights.sum()));
        }
        if (weights.sum() - 1.0).abs() > 1e-6 {
            return Err(ConfigValidationError::InvalidWeights(weights.sum()));
        }
        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value}")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid limit for '{field}': {value} (must be at least 1)")]
    InvalidLimit { field: String, value: usize },

    #[error("Quality weights must be non-negative and sum to 1.0 (got {0})")]
    InvalidWeights(f64),
}

impl From<ConfigValidationError> for crate::error::AnalysisError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    missing_sentinels: Option<Vec<String>>,
    iqr_multiplier: Option<f64>,
    zscore_threshold: Option<f64>,
    top_k_categories: Option<usize>,
    bar_chart_top_n: Option<usize>,
    pairplot_max_columns: Option<usize>,
    high_correlation_threshold: Option<f64>,
    histogram_bins: Option<usize>,
    kde: Option<bool>,
    sample_size: Option<usize>,
    quality_weights: Option<QualityWeights>,
}

impl AnalysisConfigBuilder {
    /// Replace the set of missing-value sentinels.
    pub fn missing_sentinels<I, S>(mut self, sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_sentinels = Some(sentinels.into_iter().map(Into::into).collect());
        self
    }

    /// Set the IQR fence multiplier.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the absolute z-score threshold.
    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = Some(threshold);
        self
    }

    /// Set the size of the categorical frequency table.
    pub fn top_k_categories(mut self, k: usize) -> Self {
        self.top_k_categories = Some(k);
        self
    }

    /// Set the number of bars before lumping into "other".
    pub fn bar_chart_top_n(mut self, n: usize) -> Self {
        self.bar_chart_top_n = Some(n);
        self
    }

    /// Set the pairplot column ceiling.
    pub fn pairplot_max_columns(mut self, n: usize) -> Self {
        self.pairplot_max_columns = Some(n);
        self
    }

    /// Set the "high correlation" threshold for scatter specs.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0
    pub fn high_correlation_threshold(mut self, threshold: f64) -> Self {
        self.high_correlation_threshold = Some(threshold);
        self
    }

    /// Use a fixed histogram bin count instead of Sturges' rule.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Enable or disable KDE overlays on histograms.
    pub fn kde(mut self, enable: bool) -> Self {
        self.kde = Some(enable);
        self
    }

    /// Set the number of sample values per column profile.
    pub fn sample_size(mut self, n: usize) -> Self {
        self.sample_size = Some(n);
        self
    }

    /// Set the quality score weights.
    pub fn quality_weights(mut self, weights: QualityWeights) -> Self {
        self.quality_weights = Some(weights);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            missing_sentinels: self.missing_sentinels.unwrap_or(defaults.missing_sentinels),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            zscore_threshold: self.zscore_threshold.unwrap_or(defaults.zscore_threshold),
            top_k_categories: self.top_k_categories.unwrap_or(defaults.top_k_categories),
            bar_chart_top_n: self.bar_chart_top_n.unwrap_or(defaults.bar_chart_top_n),
            pairplot_max_columns: self
                .pairplot_max_columns
                .unwrap_or(defaults.pairplot_max_columns),
            high_correlation_threshold: self
                .high_correlation_threshold
                .unwrap_or(defaults.high_correlation_threshold),
            histogram_bins: self.histogram_bins.or(defaults.histogram_bins),
            kde: self.kde.unwrap_or(defaults.kde),
            sample_size: self.sample_size.unwrap_or(defaults.sample_size),
            quality_weights: self.quality_weights.unwrap_or(defaults.quality_weights),
        };

        config.validate()?;
        Ok(config)
    }
}
