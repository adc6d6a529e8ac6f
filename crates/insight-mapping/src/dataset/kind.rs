//! Column kind inference.
//!
//! A column's kind is decided once, when the dataset view is built, and the
//! analyzers switch on it instead of probing values again.

use crate::utils::{is_boolean_dtype, is_datetime_dtype, is_numeric_dtype};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// Date pattern regexes - compiled once at startup
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}$").expect("Invalid regex: MM-DD-YYYY"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}").expect("Invalid regex: datetime"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("Invalid regex: ISO"),
    ]
});

/// Unique ratio above which a long-valued string column is free text.
const TEXT_UNIQUE_RATIO: f64 = 0.7;
/// Mean value length (bytes) above which a high-cardinality column is free text.
const TEXT_MEAN_LENGTH: f64 = 30.0;

/// The declared kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Datetime,
    Boolean,
    Text,
}

impl ColumnKind {
    /// Kinds analyzed with category frequencies and Cramér's V.
    pub fn is_categorical_like(&self) -> bool {
        matches!(self, Self::Categorical | Self::Boolean)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether a string looks like a calendar date or timestamp.
pub fn looks_like_date(value: &str) -> bool {
    let trimmed = value.trim();
    DATE_PATTERNS.iter().any(|re| re.is_match(trimmed))
}

/// Infer the kind of an already-normalized series.
///
/// String columns are datetime when every non-null value matches a date
/// pattern, text when values are mostly unique and long, and categorical
/// otherwise. All-null string columns are categorical.
pub fn infer_kind(series: &Series) -> PolarsResult<ColumnKind> {
    let dtype = series.dtype();
    if is_numeric_dtype(dtype) {
        return Ok(ColumnKind::Numeric);
    }
    if is_boolean_dtype(dtype) {
        return Ok(ColumnKind::Boolean);
    }
    if is_datetime_dtype(dtype) {
        return Ok(ColumnKind::Datetime);
    }
    if dtype != &DataType::String {
        return Ok(ColumnKind::Categorical);
    }

    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Ok(ColumnKind::Categorical);
    }

    let values = non_null.str()?;
    if values.into_iter().flatten().all(looks_like_date) {
        return Ok(ColumnKind::Datetime);
    }

    let unique_ratio = non_null.n_unique()? as f64 / non_null.len() as f64;
    let mean_length = values
        .into_iter()
        .flatten()
        .map(|v| v.len())
        .sum::<usize>() as f64
        / non_null.len() as f64;

    if unique_ratio > TEXT_UNIQUE_RATIO && mean_length > TEXT_MEAN_LENGTH {
        Ok(ColumnKind::Text)
    } else {
        Ok(ColumnKind::Categorical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_dtypes() {
        let s = Series::new("a".into(), &[1i64, 2, 3]);
        assert_eq!(infer_kind(&s).unwrap(), ColumnKind::Numeric);

        let s = Series::new("b".into(), &[1.5f64, 2.5]);
        assert_eq!(infer_kind(&s).unwrap(), ColumnKind::Numeric);
    }

    #[test]
    fn test_boolean_dtype() {
        let s = Series::new("flag".into(), &[true, false, true]);
        assert_eq!(infer_kind(&s).unwrap(), ColumnKind::Boolean);
        assert!(ColumnKind::Boolean.is_categorical_like());
    }

    #[test]
    fn test_date_strings() {
        let s = Series::new(
            "when".into(),
            &[Some("2024-01-05"), None, Some("2024-02-11")],
        );
        assert_eq!(infer_kind(&s).unwrap(), ColumnKind::Datetime);
    }

    #[test]
    fn test_mixed_strings_are_categorical() {
        let s = Series::new("city".into(), &["Paris", "2024-01-05", "Lyon", "Paris"]);
        assert_eq!(infer_kind(&s).unwrap(), ColumnKind::Categorical);
    }

    #[test]
    fn test_long_unique_strings_are_text() {
        let s = Series::new(
            "notes".into(),
            &[
                "The first rather long free-form comment about this row",
                "Another long and unique description written by somebody",
                "Third unique and lengthy note used for text classification",
            ],
        );
        assert_eq!(infer_kind(&s).unwrap(), ColumnKind::Text);
    }

    #[test]
    fn test_all_null_strings_are_categorical() {
        let s = Series::new("empty".into(), &[None::<&str>, None]);
        assert_eq!(infer_kind(&s).unwrap(), ColumnKind::Categorical);
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ColumnKind::Numeric).unwrap(),
            "\"numeric\""
        );
        assert_eq!(ColumnKind::Text.to_string(), "text");
    }
}
