//! Shared helpers for dtype checks and numeric routines.

use chrono::{DateTime, Utc};
use polars::prelude::*;

/// Integer and float dtypes, the ones analyzed as `numeric`.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric()
}

/// Calendar dtypes. Durations stay out: they are not points in time.
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(..) | DataType::Date | DataType::Time)
}

pub fn is_boolean_dtype(dtype: &DataType) -> bool {
    dtype.is_bool()
}

/// Quantile of an ascending slice using linear interpolation between
/// closest ranks. Returns `None` for an empty slice.
pub fn quantile_sorted(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(values[lower]);
    }
    let (low, high) = (values[lower], values[upper]);
    if low == high {
        return Some(low);
    }
    let weight = pos - lower as f64;
    // Weighted sum stays finite where `high - low` would overflow
    Some(low * (1.0 - weight) + high * weight)
}

/// `Some(value)` for finite floats, `None` for NaN and infinities.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Non-null values in ascending order.
pub fn sorted_present(values: &[Option<f64>]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Percentage of `part` in `total`, 0 when `total` is 0.
#[inline]
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Format a millisecond Unix timestamp for display.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_classes() {
        assert!(is_numeric_dtype(&DataType::Int32));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));

        assert!(is_boolean_dtype(&DataType::Boolean));
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(!is_datetime_dtype(&DataType::Duration(TimeUnit::Milliseconds)));
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert!((quantile_sorted(&values, 0.25).unwrap() - 2.25).abs() < 1e-12);
        assert!((quantile_sorted(&values, 0.5).unwrap() - 3.5).abs() < 1e-12);
        assert!((quantile_sorted(&values, 0.75).unwrap() - 4.75).abs() < 1e-12);
        assert_eq!(quantile_sorted(&values, 1.0), Some(100.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_quantile_extreme_and_repeated_values() {
        let q = quantile_sorted(&[-f64::MAX, f64::MAX], 0.5).unwrap();
        assert!(q.is_finite());
        assert_eq!(quantile_sorted(&[0.1; 7], 0.25), Some(0.1));
    }

    #[test]
    fn test_finite() {
        assert_eq!(finite(1.5), Some(1.5));
        assert_eq!(finite(f64::INFINITY), None);
        assert_eq!(finite(f64::NAN), None);
    }

    #[test]
    fn test_sorted_present_skips_nulls() {
        let sorted = sorted_present(&[Some(3.0), None, Some(-1.0), Some(2.0)]);
        assert_eq!(sorted, vec![-1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(10, 100), 10.0);
        assert_eq!(percent(3, 0), 0.0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
    }
}
