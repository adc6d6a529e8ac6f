//! Bias-corrected Cramér's V from a contingency table.

use super::matrix::{Coefficient, UndefinedReason};
use std::collections::BTreeMap;

/// Counts of co-occurring categories over the rows where both sides are present.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    pub counts: Vec<Vec<usize>>,
    pub total: usize,
}

impl ContingencyTable {
    pub fn build(x: &[Option<String>], y: &[Option<String>]) -> Self {
        let mut rows: BTreeMap<&str, usize> = BTreeMap::new();
        let mut cols: BTreeMap<&str, usize> = BTreeMap::new();
        let mut observed: Vec<(usize, usize)> = Vec::new();

        for (a, b) in x.iter().zip(y.iter()) {
            let (Some(a), Some(b)) = (a, b) else {
                continue;
            };
            let next_row = rows.len();
            let r = *rows.entry(a.as_str()).or_insert(next_row);
            let next_col = cols.len();
            let c = *cols.entry(b.as_str()).or_insert(next_col);
            observed.push((r, c));
        }

        let mut counts = vec![vec![0usize; cols.len()]; rows.len()];
        for (r, c) in &observed {
            counts[*r][*c] += 1;
        }
        Self {
            counts,
            total: observed.len(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (
            self.counts.len(),
            self.counts.first().map(|r| r.len()).unwrap_or(0),
        )
    }

    /// Pearson's chi-squared statistic against independence.
    pub fn chi_squared(&self) -> f64 {
        let n = self.total as f64;
        if n == 0.0 {
            return 0.0;
        }
        let (r, k) = self.shape();
        let row_sums: Vec<f64> = self
            .counts
            .iter()
            .map(|row| row.iter().sum::<usize>() as f64)
            .collect();
        let col_sums: Vec<f64> = (0..k)
            .map(|j| self.counts.iter().map(|row| row[j]).sum::<usize>() as f64)
            .collect();

        let mut chi2 = 0.0;
        for i in 0..r {
            for j in 0..k {
                let expected = row_sums[i] * col_sums[j] / n;
                if expected > 0.0 {
                    let diff = self.counts[i][j] as f64 - expected;
                    chi2 += diff * diff / expected;
                }
            }
        }
        chi2
    }
}

/// Cramér's V with the Bergsma (2013) small-sample correction, clamped to [0, 1].
///
/// ```text
/// phi2      = chi2 / n
/// phi2corr  = max(0, phi2 - (k-1)(r-1)/(n-1))
/// rcorr     = r - (r-1)^2/(n-1)
/// kcorr     = k - (k-1)^2/(n-1)
/// V         = sqrt(phi2corr / min(kcorr-1, rcorr-1))
/// ```
pub fn cramers_v(x: &[Option<String>], y: &[Option<String>]) -> Coefficient {
    let table = ContingencyTable::build(x, y);
    if table.total == 0 {
        return Coefficient::undefined(UndefinedReason::AllMissing);
    }
    let (r, k) = table.shape();
    if r < 2 || k < 2 {
        return Coefficient::undefined(UndefinedReason::SingleCategory);
    }
    if table.total < 2 {
        return Coefficient::undefined(UndefinedReason::InsufficientData);
    }

    let n = table.total as f64;
    let (r, k) = (r as f64, k as f64);
    let phi2 = table.chi_squared() / n;
    let phi2corr = (phi2 - (k - 1.0) * (r - 1.0) / (n - 1.0)).max(0.0);
    let rcorr = r - (r - 1.0).powi(2) / (n - 1.0);
    let kcorr = k - (k - 1.0).powi(2) / (n - 1.0);
    let denominator = (kcorr - 1.0).min(rcorr - 1.0);

    if denominator <= 0.0 || !denominator.is_finite() {
        return Coefficient::undefined(UndefinedReason::InsufficientData);
    }
    let v = (phi2corr / denominator).sqrt();
    if !v.is_finite() {
        return Coefficient::undefined(UndefinedReason::InsufficientData);
    }
    Coefficient::defined(v.clamp(0.0, 1.0))
}

/// Diagonal entry for a categorical column: 1.0 with two or more categories.
pub fn self_association(values: &[Option<String>]) -> Coefficient {
    let mut distinct = values.iter().flatten();
    let Some(first) = distinct.next() else {
        return Coefficient::undefined(UndefinedReason::AllMissing);
    };
    if distinct.any(|v| v != first) {
        Coefficient::defined(1.0)
    } else {
        Coefficient::undefined(UndefinedReason::SingleCategory)
    }
}
