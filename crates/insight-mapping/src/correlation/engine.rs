use super::cramers::{cramers_v, self_association};
use super::matrix::{Coefficient, CorrelationMatrix, CorrelationMethod};
use super::pearson::{pearson, self_correlation};
use crate::dataset::DatasetView;
use crate::error::Result;
use crate::pipeline::CancellationToken;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Builds the numeric (Pearson) and categorical (Cramér's V) matrices.
///
/// Column pairs are independent, so they are evaluated on the rayon pool;
/// each task returns its own cell and the matrix is assembled afterwards.
pub struct CorrelationEngine {
    cancellation_token: CancellationToken,
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationEngine {
    pub fn new() -> Self {
        Self {
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Pearson matrix over the numeric columns.
    pub fn numeric_matrix(&self, view: &DatasetView) -> Result<CorrelationMatrix> {
        let columns = view.numeric_columns();
        let names: Vec<String> = columns.iter().map(|c| c.name.to_string()).collect();
        let values = columns
            .iter()
            .map(|c| c.numeric_values())
            .collect::<Result<Vec<_>>>()?;

        let diagonal = values.iter().map(|v| self_correlation(v)).collect();
        let pairs = self.evaluate_pairs(values.len(), |i, j| pearson(&values[i], &values[j]))?;

        let matrix = CorrelationMatrix::from_pairs(CorrelationMethod::Pearson, names, diagonal, pairs);
        log_undefined(&matrix);
        Ok(matrix)
    }

    /// Cramér's V matrix over the categorical and boolean columns.
    pub fn categorical_matrix(&self, view: &DatasetView) -> Result<CorrelationMatrix> {
        let columns = view.categorical_columns();
        let names: Vec<String> = columns.iter().map(|c| c.name.to_string()).collect();
        let values = columns
            .iter()
            .map(|c| c.string_values())
            .collect::<Result<Vec<_>>>()?;

        let diagonal = values.iter().map(|v| self_association(v)).collect();
        let pairs = self.evaluate_pairs(values.len(), |i, j| cramers_v(&values[i], &values[j]))?;

        let matrix =
            CorrelationMatrix::from_pairs(CorrelationMethod::CramersV, names, diagonal, pairs);
        log_undefined(&matrix);
        Ok(matrix)
    }

    /// Evaluate every `i < j` pair in parallel, checking for cancellation per pair.
    fn evaluate_pairs<F>(&self, size: usize, measure: F) -> Result<Vec<(usize, usize, Coefficient)>>
    where
        F: Fn(usize, usize) -> Coefficient + Sync,
    {
        let pairs: Vec<(usize, usize)> = (0..size)
            .flat_map(|i| ((i + 1)..size).map(move |j| (i, j)))
            .collect();
        debug!("Evaluating {} column pairs", pairs.len());

        pairs
            .par_iter()
            .map(|&(i, j)| {
                self.cancellation_token.check()?;
                Ok((i, j, measure(i, j)))
            })
            .collect()
    }
}

fn log_undefined(matrix: &CorrelationMatrix) {
    for pair in matrix.pairs() {
        if let Coefficient::Undefined { reason } = pair.coefficient {
            warn!(
                "{} between '{}' and '{}' undefined: {}",
                matrix.method, pair.first, pair.second, reason
            );
        }
    }
}
