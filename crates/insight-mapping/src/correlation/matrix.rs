//! Symmetric correlation matrices with explicit undefined entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Association measure used to fill a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Pearson product-moment correlation, in [-1, 1].
    Pearson,
    /// Bias-corrected Cramér's V, in [0, 1].
    CramersV,
}

impl CorrelationMethod {
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Pearson => (-1.0, 1.0),
            Self::CramersV => (0.0, 1.0),
        }
    }

    /// Column kinds the method is computed over.
    pub fn scope(&self) -> &'static str {
        match self {
            Self::Pearson => "numeric",
            Self::CramersV => "categorical",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pearson => f.write_str("Pearson"),
            Self::CramersV => f.write_str("Cramér's V"),
        }
    }
}

/// Why a coefficient could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// One of the columns is constant over the shared rows.
    ZeroVariance,
    /// One of the columns has a single category over the shared rows.
    SingleCategory,
    /// Too few shared rows for the estimator.
    InsufficientData,
    /// No row has a value in both columns.
    AllMissing,
}

impl fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ZeroVariance => "zero variance",
            Self::SingleCategory => "single category",
            Self::InsufficientData => "insufficient data",
            Self::AllMissing => "all missing",
        };
        f.write_str(text)
    }
}

/// One matrix cell. Undefined is distinct from 0 ("uncorrelated").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Coefficient {
    Defined { value: f64 },
    Undefined { reason: UndefinedReason },
}

impl Coefficient {
    pub fn defined(value: f64) -> Self {
        Self::Defined { value }
    }

    pub fn undefined(reason: UndefinedReason) -> Self {
        Self::Undefined { reason }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined { value } => Some(*value),
            Self::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined { .. })
    }
}

/// A pair of columns and their coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationPair<'a> {
    pub first: &'a str,
    pub second: &'a str,
    pub coefficient: Coefficient,
}

/// Square, symmetric matrix over a list of columns.
///
/// `cells[i][j]` is the coefficient between `columns[i]` and `columns[j]`.
/// The diagonal is 1.0 for columns whose own values are non-degenerate and
/// undefined otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Coefficient>>,
}

impl CorrelationMatrix {
    /// Build a matrix from a diagonal and the upper-triangle pair results.
    ///
    /// Each pair `(i, j, c)` with `i < j` is written to both `(i, j)` and
    /// `(j, i)`, so the result is symmetric by construction.
    pub fn from_pairs(
        method: CorrelationMethod,
        columns: Vec<String>,
        diagonal: Vec<Coefficient>,
        pairs: impl IntoIterator<Item = (usize, usize, Coefficient)>,
    ) -> Self {
        let size = columns.len();
        let mut cells =
            vec![vec![Coefficient::undefined(UndefinedReason::InsufficientData); size]; size];
        for (i, coefficient) in diagonal.into_iter().enumerate().take(size) {
            cells[i][i] = coefficient;
        }
        for (i, j, coefficient) in pairs {
            if i < size && j < size {
                cells[i][j] = coefficient;
                cells[j][i] = coefficient;
            }
        }
        Self {
            method,
            columns,
            cells,
        }
    }

    pub fn empty(method: CorrelationMethod) -> Self {
        Self {
            method,
            columns: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Coefficient between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<&Coefficient> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.cells.get(i)?.get(j)
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.len()).all(|i| (0..i).all(|j| self.cells[i][j] == self.cells[j][i]))
    }

    /// Off-diagonal pairs in row-major upper-triangle order.
    pub fn pairs(&self) -> impl Iterator<Item = CorrelationPair<'_>> {
        let size = self.len();
        (0..size).flat_map(move |i| {
            ((i + 1)..size).map(move |j| CorrelationPair {
                first: &self.columns[i],
                second: &self.columns[j],
                coefficient: self.cells[i][j],
            })
        })
    }

    /// Defined pairs with `|value| > threshold`, in upper-triangle order.
    pub fn strong_pairs(&self, threshold: f64) -> Vec<CorrelationPair<'_>> {
        self.pairs()
            .filter(|p| p.coefficient.value().is_some_and(|v| v.abs() > threshold))
            .collect()
    }
}
