//! Moment-based statistics over the non-null values of a column.
//!
//! Variance and standard deviation use the sample (n - 1) denominator.
//! Skewness is the adjusted Fisher-Pearson coefficient `G1` and kurtosis the
//! bias-corrected excess kurtosis `G2`, the estimators used by most
//! statistics packages.

use crate::utils::finite;

/// Arithmetic mean. Finite for any finite input, even when the plain sum
/// overflows.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        return Some(sum / n);
    }
    let scale = magnitude(values);
    Some(values.iter().map(|v| v / scale).sum::<f64>() / n * scale)
}

/// Sample variance. A single value or a constant column has variance 0;
/// `None` when the result exceeds the f64 range.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let (variance, _) = spread(values, 1)?;
    variance
}

/// Sample standard deviation, exactly 0 for constant input.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    spread(values, 1)?.1
}

/// Population standard deviation (1/n).
pub fn population_std(values: &[f64]) -> Option<f64> {
    spread(values, 0)?.1
}

/// Whether every value equals the first one.
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Largest absolute value; 1.0 for all-zero input so it can divide.
fn magnitude(values: &[f64]) -> f64 {
    let max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max > 0.0 { max } else { 1.0 }
}

/// Deviations from the mean divided by the largest magnitude, returned
/// with that scale. Always finite for finite input.
pub fn scaled_deviations(values: &[f64]) -> Option<(Vec<f64>, f64)> {
    let mean = mean(values)?;
    let scale = magnitude(values);
    let deviations = values.iter().map(|v| v / scale - mean / scale).collect();
    Some((deviations, scale))
}

/// Variance and standard deviation with `n - ddof` in the denominator.
/// The outer `None` means no values; an inner `None` means overflow.
fn spread(values: &[f64], ddof: usize) -> Option<(Option<f64>, Option<f64>)> {
    let mean = mean(values)?;
    if values.len() <= ddof || is_constant(values) {
        return Some((Some(0.0), Some(0.0)));
    }
    let denominator = (values.len() - ddof) as f64;

    let direct = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / denominator;
    if direct.is_finite() {
        return Some((Some(direct), Some(direct.sqrt())));
    }

    let (deviations, scale) = scaled_deviations(values)?;
    let scaled = deviations.iter().map(|d| d * d).sum::<f64>() / denominator;
    Some((finite(scaled * scale * scale), finite(scaled.sqrt() * scale)))
}

/// Central moments m2, m3, m4 of the scaled deviations, population (1/n)
/// denominator. Skewness and kurtosis are scale free, so the scale drops out.
fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    let (deviations, _) = scaled_deviations(values)?;
    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for d in deviations {
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    Some((m2 / n, m3 / n, m4 / n))
}

/// Adjusted skewness. Undefined below 3 values or at zero variance.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 || is_constant(values) {
        return None;
    }
    let (m2, m3, _) = central_moments(values)?;
    if m2 <= f64::EPSILON * f64::EPSILON {
        return None;
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    finite(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Excess kurtosis, bias corrected. Undefined below 4 values or at zero variance.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 || is_constant(values) {
        return None;
    }
    let (m2, _, m4) = central_moments(values)?;
    if m2 <= f64::EPSILON * f64::EPSILON {
        return None;
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    finite(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}
