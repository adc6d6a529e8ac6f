//! Correlation structure of a dataset.
//!
//! Two matrices are produced per report: Pearson over numeric columns and
//! bias-corrected Cramér's V over categorical and boolean columns. Cells that
//! cannot be computed carry an explicit [`UndefinedReason`].

pub mod cramers;
mod engine;
pub mod matrix;
pub mod pearson;

pub use cramers::{ContingencyTable, cramers_v};
pub use engine::CorrelationEngine;
pub use matrix::{Coefficient, CorrelationMatrix, CorrelationMethod, CorrelationPair, UndefinedReason};
pub use pearson::pearson;

use crate::reporting::Diagnostics;

impl Diagnostics for CorrelationMatrix {
    fn degradations(&self) -> Vec<String> {
        self.pairs()
            .filter_map(|pair| match pair.coefficient {
                Coefficient::Undefined { reason } => {
                    Some(format!("{} / {}: {}", pair.first, pair.second, reason))
                }
                Coefficient::Defined { .. } => None,
            })
            .collect()
    }
}
