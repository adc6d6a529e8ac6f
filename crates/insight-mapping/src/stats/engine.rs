use super::moments::{kurtosis, mean, sample_std, sample_variance, skewness};
use super::{
    CategoricalSummary, CategoryFrequency, ColumnProfile, DatetimeSummary, NumericSummary,
    StatsReport,
};
use crate::config::AnalysisConfig;
use crate::dataset::{ColumnKind, ColumnRef, DatasetView};
use crate::error::{Result, ResultExt};
use crate::pipeline::CancellationToken;
use crate::utils::{finite, format_timestamp, percent, quantile_sorted, sorted_present};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rand::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y"];

/// Computes one [`ColumnProfile`] per column, in dataset order.
pub struct DescriptiveStatsEngine {
    config: AnalysisConfig,
    cancellation_token: CancellationToken,
}

impl DescriptiveStatsEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn analyze(&self, view: &DatasetView) -> Result<StatsReport> {
        let mut profiles = Vec::with_capacity(view.width());

        for column in view.columns() {
            self.cancellation_token.check()?;

            let profile = match self.profile_column(&column) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!("Statistics unavailable for '{}': {}", column.name, e);
                    let mut profile = base_profile(&column);
                    profile.warnings.push(format!("statistics unavailable: {}", e));
                    profile
                }
            };
            for warning in &profile.warnings {
                debug!("Column '{}': {}", profile.name, warning);
            }
            profiles.push(profile);
        }

        let memory_bytes = profiles.iter().map(|p| p.memory_bytes).sum();
        Ok(StatsReport {
            profiles,
            memory_bytes,
        })
    }

    fn profile_column(&self, column: &ColumnRef<'_>) -> Result<ColumnProfile> {
        let mut profile = base_profile(column);
        profile.unique_count = column
            .series
            .drop_nulls()
            .n_unique()
            .context(format!("Counting distinct values of '{}'", column.name))?;

        let rendered = column.string_values()?;
        profile.sample_values = self.sample_values(&rendered);

        match column.kind {
            ColumnKind::Numeric => {
                let values = column.numeric_values()?;
                profile.numeric = numeric_summary(&values, &mut profile.warnings);
            }
            ColumnKind::Categorical | ColumnKind::Boolean | ColumnKind::Text => {
                profile.categorical = self.categorical_summary(&rendered, &mut profile.warnings);
            }
            ColumnKind::Datetime => {
                profile.datetime = Some(datetime_summary(column.series, &rendered));
            }
        }
        Ok(profile)
    }

    /// Seeded sample of non-null values, in row order.
    fn sample_values(&self, rendered: &[Option<String>]) -> Vec<String> {
        let present: Vec<&String> = rendered.iter().flatten().collect();
        let sample_size = self.config.sample_size.min(present.len());
        let mut rng = StdRng::seed_from_u64(42);
        let mut sampled: Vec<usize> = (0..present.len())
            .collect::<Vec<_>>()
            .choose_multiple(&mut rng, sample_size)
            .copied()
            .collect();
        sampled.sort_unstable();
        sampled.into_iter().map(|i| present[i].clone()).collect()
    }

    fn categorical_summary(
        &self,
        rendered: &[Option<String>],
        warnings: &mut Vec<String>,
    ) -> Option<CategoricalSummary> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in rendered.iter().flatten() {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }
        let non_null: usize = counts.values().sum();
        if non_null == 0 {
            warnings.push("frequencies undefined: all values missing".to_string());
            return None;
        }
        if counts.len() == 1 {
            warnings.push("single category".to_string());
        }

        let distinct_count = counts.len();
        let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
        // BTreeMap order breaks count ties alphabetically
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        let top_values: Vec<CategoryFrequency> = entries
            .iter()
            .take(self.config.top_k_categories)
            .map(|(value, count)| CategoryFrequency {
                value: value.to_string(),
                count: *count,
                percent: percent(*count, non_null),
            })
            .collect();
        let covered: usize = top_values.iter().map(|f| f.count).sum();

        Some(CategoricalSummary {
            mode: top_values.first().map(|f| f.value.clone()),
            other_count: non_null - covered,
            distinct_count,
            top_values,
        })
    }
}

fn base_profile(column: &ColumnRef<'_>) -> ColumnProfile {
    let row_count = column.series.len();
    let missing_count = column.null_count();
    ColumnProfile {
        name: column.name.to_string(),
        kind: column.kind,
        dtype: column.series.dtype().to_string(),
        row_count,
        non_null_count: row_count - missing_count,
        missing_count,
        missing_percent: percent(missing_count, row_count),
        unique_count: 0,
        memory_bytes: column.memory_bytes(),
        sample_values: Vec::new(),
        numeric: None,
        categorical: None,
        datetime: None,
        warnings: Vec::new(),
    }
}

fn numeric_summary(values: &[Option<f64>], warnings: &mut Vec<String>) -> Option<NumericSummary> {
    let sorted = sorted_present(values);
    let (Some(&min), Some(&max), Some(mean)) = (sorted.first(), sorted.last(), mean(&sorted))
    else {
        warnings.push("numeric statistics undefined: all values missing".to_string());
        return None;
    };

    if sorted.len() < 2 {
        warnings.push("std reported as 0: fewer than two values".to_string());
    }
    let variance = sample_variance(&sorted);
    if variance.is_none() {
        warnings.push("variance undefined: exceeds the f64 range".to_string());
    }
    let std = sample_std(&sorted);
    if std.is_none() {
        warnings.push("std undefined: exceeds the f64 range".to_string());
    }
    let skewness = skewness(&sorted);
    if skewness.is_none() {
        warnings.push("skewness undefined".to_string());
    }
    let kurtosis = kurtosis(&sorted);
    if kurtosis.is_none() {
        warnings.push("kurtosis undefined".to_string());
    }

    let q1 = quantile_sorted(&sorted, 0.25).unwrap_or(min);
    let q3 = quantile_sorted(&sorted, 0.75).unwrap_or(max);
    let iqr = finite(q3 - q1);
    if iqr.is_none() {
        warnings.push("iqr undefined: exceeds the f64 range".to_string());
    }
    Some(NumericSummary {
        mean,
        median: quantile_sorted(&sorted, 0.5).unwrap_or(mean),
        std,
        variance,
        skewness,
        kurtosis,
        min,
        max,
        q1,
        q3,
        iqr,
        zeros: sorted.iter().filter(|v| **v == 0.0).count(),
        negatives: sorted.iter().filter(|v| **v < 0.0).count(),
    })
}

/// Earliest and latest values, from the temporal dtype when there is one,
/// otherwise by parsing the rendered strings.
fn datetime_summary(series: &Series, rendered: &[Option<String>]) -> DatetimeSummary {
    let physical: Option<Vec<i64>> = if series.dtype() == &DataType::String {
        None
    } else {
        series
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .ok()
            .and_then(|casted| {
                casted
                    .datetime()
                    .ok()
                    .map(|ca| ca.physical().into_iter().flatten().collect())
            })
    };

    if let Some(values) = physical.filter(|v| !v.is_empty()) {
        return DatetimeSummary {
            earliest: values.iter().min().map(|v| format_timestamp(*v)),
            latest: values.iter().max().map(|v| format_timestamp(*v)),
        };
    }

    let parsed: Vec<NaiveDateTime> = rendered
        .iter()
        .flatten()
        .filter_map(|v| parse_datetime(v))
        .collect();
    let render = |dt: &NaiveDateTime| dt.format("%Y-%m-%d %H:%M:%S").to_string();
    DatetimeSummary {
        earliest: parsed.iter().min().map(render),
        latest: parsed.iter().max().map(render),
    }
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
