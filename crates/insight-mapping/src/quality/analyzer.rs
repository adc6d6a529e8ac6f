use super::{
    ColumnDuplicates, ColumnOutliers, DataQualityScore, DuplicateColumnPair, DuplicateReport,
    MissingColumn, MissingValueTable, OutlierReport, QualityRatios, QualityReport, iqr_outliers,
    zscore_outliers,
};
use crate::config::AnalysisConfig;
use crate::dataset::DatasetView;
use crate::error::{Result, ResultExt};
use crate::pipeline::CancellationToken;
use crate::utils::percent;
use polars::prelude::*;
use tracing::{debug, warn};

/// Computes missingness, duplicates, outliers and the quality score.
pub struct QualityAnalyzer {
    config: AnalysisConfig,
    cancellation_token: CancellationToken,
}

impl QualityAnalyzer {
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

    pub fn analyze(&self, view: &DatasetView) -> Result<QualityReport> {
        let missing = Self::missing_values(view);
        self.cancellation_token.check()?;

        let duplicates = Self::duplicates(view)?;
        self.cancellation_token.check()?;

        let mut notes = Vec::new();
        let outliers = self.outliers(view, &mut notes)?;

        let ratios = QualityRatios {
            avg_missing: missing.average_ratio(),
            duplicate_rows: duplicates.percent / 100.0,
            avg_outlier: outliers.average_ratio(),
        };
        let score = DataQualityScore::compute(ratios, self.config.quality_weights);
        debug!("Quality score: {:.2}", score.score);

        Ok(QualityReport {
            missing,
            duplicates,
            outliers,
            score,
            notes,
        })
    }

    fn missing_values(view: &DatasetView) -> MissingValueTable {
        let rows = view.height();
        let columns: Vec<MissingColumn> = view
            .columns()
            .map(|column| {
                let missing_count = column.null_count();
                MissingColumn {
                    column: column.name.to_string(),
                    missing_count,
                    non_null_count: rows - missing_count,
                    missing_percent: percent(missing_count, rows),
                }
            })
            .collect();

        let total_missing_cells: usize = columns.iter().map(|c| c.missing_count).sum();
        MissingValueTable {
            total_missing_percent: percent(total_missing_cells, rows * view.width()),
            total_missing_cells,
            columns,
        }
    }

    fn duplicates(view: &DatasetView) -> Result<DuplicateReport> {
        let df = view.frame();
        let total_rows = df.height();

        let unique_rows = if df.width() == 0 || total_rows == 0 {
            total_rows
        } else {
            df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)
                .context("Detecting duplicate rows")?
                .height()
        };
        let row_count = total_rows - unique_rows;

        let mut by_column = Vec::with_capacity(view.width());
        for column in view.columns() {
            let distinct = column
                .series
                .n_unique()
                .context(format!("Counting distinct values of '{}'", column.name))?;
            by_column.push(ColumnDuplicates {
                column: column.name.to_string(),
                duplicate_values: column.series.len().saturating_sub(distinct),
            });
        }

        Ok(DuplicateReport {
            row_count,
            percent: percent(row_count, total_rows),
            total_rows,
            unique_rows,
            column_pairs: Self::duplicate_column_pairs(view)?,
            by_column,
        })
    }

    /// Pairs of columns with identical value sequences, nulls included.
    fn duplicate_column_pairs(view: &DatasetView) -> Result<Vec<DuplicateColumnPair>> {
        let columns: Vec<_> = view.columns().collect();
        let mut rendered: Vec<Option<Vec<Option<String>>>> = vec![None; columns.len()];
        let mut pairs = Vec::new();

        for i in 0..columns.len() {
            for j in (i + 1)..columns.len() {
                if columns[i].null_count() != columns[j].null_count() {
                    continue;
                }
                for k in [i, j] {
                    if rendered[k].is_none() {
                        rendered[k] = Some(columns[k].string_values()?);
                    }
                }
                if rendered[i] == rendered[j] {
                    pairs.push(DuplicateColumnPair {
                        first: columns[i].name.to_string(),
                        second: columns[j].name.to_string(),
                    });
                }
            }
        }
        Ok(pairs)
    }

    fn outliers(&self, view: &DatasetView, notes: &mut Vec<String>) -> Result<OutlierReport> {
        let mut columns = Vec::new();
        for column in view.numeric_columns() {
            self.cancellation_token.check()?;

            let values = match column.numeric_values() {
                Ok(values) => values,
                Err(e) => {
                    warn!("Skipping outliers for '{}': {}", column.name, e);
                    notes.push(format!("{}: outliers skipped ({})", column.name, e));
                    continue;
                }
            };

            columns.push(ColumnOutliers {
                column: column.name.to_string(),
                non_null_count: values.iter().flatten().count(),
                iqr: iqr_outliers(&values, self.config.iqr_multiplier),
                zscore: zscore_outliers(&values, self.config.zscore_threshold),
            });
        }
        Ok(OutlierReport { columns })
    }
}
