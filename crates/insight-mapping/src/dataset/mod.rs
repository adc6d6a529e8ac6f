//! The canonical dataset view consumed by every analyzer.
//!
//! A [`DatasetView`] wraps a polars `DataFrame` together with one
//! [`ColumnKind`] per column. Construction enforces the loader contract:
//!
//! - every column has the same row count,
//! - column names are unique and non-empty,
//! - missing values use a single representation (polars null).
//!
//! String values matching a configured sentinel and non-finite floats
//! (`NaN`, infinities) become null; string columns whose values all parse
//! as numbers become `Float64`. List and struct columns are rendered to
//! strings. Kinds are inferred once and never recomputed.

pub mod kind;
pub mod loader;

pub use kind::{ColumnKind, infer_kind, looks_like_date};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result, ResultExt};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Immutable, typed in-memory table shared read-only by all analyzers.
#[derive(Debug, Clone)]
pub struct DatasetView {
    name: String,
    frame: DataFrame,
    kinds: Vec<ColumnKind>,
    loaded_at: DateTime<Utc>,
}

static_assertions::assert_impl_all!(DatasetView: Send, Sync);

/// Borrowed view of one column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRef<'a> {
    pub index: usize,
    pub name: &'a str,
    pub kind: ColumnKind,
    pub series: &'a Series,
}

impl DatasetView {
    /// Build a view from a loaded DataFrame.
    ///
    /// A DataFrame already guarantees uniform heights and unique names, but
    /// both are re-checked so the contract holds for any caller.
    pub fn from_dataframe(df: DataFrame, config: &AnalysisConfig) -> Result<Self> {
        let series: Vec<Series> = df
            .get_columns()
            .iter()
            .map(|c| c.as_materialized_series().clone())
            .collect();
        Self::from_series(series, config)
    }

    /// Build a view from individual columns, validating the dataset contract.
    ///
    /// # Errors
    ///
    /// Returns a fatal error for ragged row counts, duplicate names, or an
    /// empty column name.
    pub fn from_series(columns: Vec<Series>, config: &AnalysisConfig) -> Result<Self> {
        validate_columns(&columns)?;

        let mut normalized = Vec::with_capacity(columns.len());
        let mut kinds = Vec::with_capacity(columns.len());
        for series in columns {
            let series = normalize_missing(series, config)
                .context("Normalizing missing values")?;
            let kind = infer_kind(&series).context(format!("Inferring kind of '{}'", series.name()))?;
            debug!("Column '{}' inferred as {}", series.name(), kind);
            kinds.push(kind);
            normalized.push(Column::from(series));
        }

        let frame = DataFrame::new(normalized).context("Building dataset view")?;
        Ok(Self {
            name: "dataset".to_string(),
            frame,
            kinds,
            loaded_at: Utc::now(),
        })
    }

    /// Set the dataset name shown in reports.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the load timestamp (normally captured at construction).
    pub fn with_loaded_at(mut self, loaded_at: DateTime<Utc>) -> Self {
        self.loaded_at = loaded_at;
        self
    }

    /// Override the inferred kind of one column before analysis.
    ///
    /// Forcing `Numeric` onto a non-numeric column casts it to `Float64`;
    /// values that cannot be parsed become null.
    pub fn with_kind(mut self, column: &str, kind: ColumnKind) -> Result<Self> {
        let index = self
            .index_of(column)
            .ok_or_else(|| AnalysisError::ColumnNotFound(column.to_string()))?;

        if kind == ColumnKind::Numeric && self.kinds[index] != ColumnKind::Numeric {
            let casted = self.frame.get_columns()[index]
                .as_materialized_series()
                .cast(&DataType::Float64)
                .context(format!("Casting '{}' to numeric", column))?;
            self.frame
                .replace_column(index, casted)
                .context(format!("Replacing column '{}'", column))?;
        }
        self.kinds[index] = kind;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Number of rows shared by every column.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.frame
            .get_columns()
            .iter()
            .position(|c| c.name().as_str() == name)
    }

    /// Columns in dataset order.
    pub fn columns(&self) -> impl Iterator<Item = ColumnRef<'_>> {
        self.frame
            .get_columns()
            .iter()
            .zip(self.kinds.iter())
            .enumerate()
            .map(|(index, (column, kind))| ColumnRef {
                index,
                name: column.name().as_str(),
                kind: *kind,
                series: column.as_materialized_series(),
            })
    }

    pub fn column(&self, index: usize) -> Option<ColumnRef<'_>> {
        self.columns().nth(index)
    }

    /// Columns of the given kind, in dataset order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<ColumnRef<'_>> {
        self.columns().filter(|c| c.kind == kind).collect()
    }

    /// Numeric columns, in dataset order.
    pub fn numeric_columns(&self) -> Vec<ColumnRef<'_>> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    /// Categorical and boolean columns, in dataset order.
    pub fn categorical_columns(&self) -> Vec<ColumnRef<'_>> {
        self.columns()
            .filter(|c| c.kind.is_categorical_like())
            .collect()
    }

    /// Estimated in-memory size of the whole dataset, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.frame.estimated_size()
    }
}

impl ColumnRef<'_> {
    pub fn null_count(&self) -> usize {
        self.series.null_count()
    }

    /// Values as `f64`, null where missing.
    pub fn numeric_values(&self) -> Result<Vec<Option<f64>>> {
        let casted = self
            .series
            .cast(&DataType::Float64)
            .context(format!("Casting '{}' to Float64", self.name))?;
        let values = casted
            .f64()
            .context(format!("Reading '{}' as Float64", self.name))?
            .into_iter()
            .collect();
        Ok(values)
    }

    /// Values rendered as strings, null where missing.
    pub fn string_values(&self) -> Result<Vec<Option<String>>> {
        let casted = self
            .series
            .cast(&DataType::String)
            .context(format!("Casting '{}' to String", self.name))?;
        let values = casted
            .str()
            .context(format!("Reading '{}' as String", self.name))?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(values)
    }

    /// Estimated in-memory size of this column, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.series.estimated_size()
    }
}

fn validate_columns(columns: &[Series]) -> Result<()> {
    let expected = columns.first().map(|s| s.len()).unwrap_or(0);
    let mut seen = HashSet::with_capacity(columns.len());

    for (position, series) in columns.iter().enumerate() {
        let name = series.name().as_str();
        if name.trim().is_empty() {
            return Err(AnalysisError::EmptyColumnName(position));
        }
        if !seen.insert(name) {
            return Err(AnalysisError::DuplicateColumn(name.to_string()));
        }
        if series.len() != expected {
            return Err(AnalysisError::RaggedColumns {
                column: name.to_string(),
                expected,
                found: series.len(),
            });
        }
    }
    Ok(())
}

/// Map every missing representation onto polars null.
fn normalize_missing(series: Series, config: &AnalysisConfig) -> PolarsResult<Series> {
    let name = series.name().clone();
    match series.dtype() {
        DataType::String => {
            let values: Vec<Option<&str>> = series
                .str()?
                .into_iter()
                .map(|v| v.filter(|s| !config.is_missing_sentinel(s)))
                .collect();

            let present: Vec<&str> = values.iter().flatten().copied().collect();
            if !present.is_empty() && present.iter().all(|v| v.trim().parse::<f64>().is_ok()) {
                let parsed: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
                    .map(|v| v.filter(|x| x.is_finite()))
                    .collect();
                return Ok(Series::new(name, parsed));
            }
            Ok(Series::new(name, values))
        }
        DataType::Float64 => {
            let values: Vec<Option<f64>> = series
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();
            Ok(Series::new(name, values))
        }
        DataType::Float32 => {
            let values: Vec<Option<f32>> = series
                .f32()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();
            Ok(Series::new(name, values))
        }
        dtype if dtype.is_nested() => {
            let rendered = (0..series.len())
                .map(|i| {
                    series.get(i).map(|value| match value {
                        AnyValue::Null => None,
                        value => Some(value.to_string()),
                    })
                })
                .collect::<PolarsResult<Vec<Option<String>>>>()?;
            Ok(Series::new(name, rendered))
        }
        _ => Ok(series),
    }
}
