//! Pearson correlation with pairwise complete cases.

use super::matrix::{Coefficient, UndefinedReason};
use crate::stats::moments::{is_constant, scaled_deviations};

/// Pearson's r over the rows where both columns have a value.
///
/// Rows with a null on either side are dropped for this pair only.
/// Constant input over the shared rows yields `ZeroVariance` rather than
/// 0 or 1.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Coefficient {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        })
        .unzip();

    match xs.len() {
        0 => return Coefficient::undefined(UndefinedReason::AllMissing),
        1 => return Coefficient::undefined(UndefinedReason::InsufficientData),
        _ => {}
    }
    if is_constant(&xs) || is_constant(&ys) {
        return Coefficient::undefined(UndefinedReason::ZeroVariance);
    }

    // r is scale free; dividing by each column's magnitude keeps the sums finite
    let (Some((dxs, _)), Some((dys, _))) = (scaled_deviations(&xs), scaled_deviations(&ys)) else {
        return Coefficient::undefined(UndefinedReason::AllMissing);
    };
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (dx, dy) in dxs.iter().zip(dys.iter()) {
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Coefficient::undefined(UndefinedReason::ZeroVariance);
    }
    Coefficient::defined((sxy / denominator).clamp(-1.0, 1.0))
}

/// Diagonal entry for a numeric column: 1.0 unless the column is degenerate.
pub fn self_correlation(values: &[Option<f64>]) -> Coefficient {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    match present.len() {
        0 => Coefficient::undefined(UndefinedReason::AllMissing),
        1 => Coefficient::undefined(UndefinedReason::InsufficientData),
        _ if is_constant(&present) => Coefficient::undefined(UndefinedReason::ZeroVariance),
        _ => Coefficient::defined(1.0),
    }
}
