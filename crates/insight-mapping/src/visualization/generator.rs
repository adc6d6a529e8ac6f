use super::{ChartKind, ChartParams, OTHER_LABEL, VisualizationPlan, VisualizationSpec};
use crate::config::AnalysisConfig;
use crate::correlation::{CorrelationMatrix, CorrelationMethod};
use crate::dataset::{ColumnKind, ColumnRef, DatasetView};
use crate::quality::QualityReport;
use crate::stats::{CategoryFrequency, StatsReport};
use crate::utils::percent;
use std::collections::BTreeMap;
use tracing::debug;

/// Analyzer outputs available to the generator. A stage that failed is `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOutputs<'a> {
    pub quality: Option<&'a QualityReport>,
    pub stats: Option<&'a StatsReport>,
    pub numeric: Option<&'a CorrelationMatrix>,
    pub categorical: Option<&'a CorrelationMatrix>,
}

/// Derives the ordered chart list for a dataset.
///
/// Order: a bar of missing counts when any column has missing values, then
/// per-column charts in column order (histogram, box, violin for numeric
/// columns; bar for categorical and boolean ones), then the pairplot, then one heatmap per matrix, then one scatter per strongly
/// correlated numeric pair.
pub struct VisualizationGenerator {
    config: AnalysisConfig,
}

impl VisualizationGenerator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, view: &DatasetView, outputs: AnalysisOutputs<'_>) -> VisualizationPlan {
        let mut plan = VisualizationPlan::default();

        if let Some(quality) = outputs.quality {
            missing_values(quality, &mut plan);
        }

        for column in view.columns() {
            match column.kind {
                ColumnKind::Numeric => {
                    plan.specs.push(self.histogram(&column, outputs.stats));
                    plan.specs.push(self.box_plot(&column, outputs.quality));
                    plan.specs.push(violin(&column));
                }
                ColumnKind::Categorical | ColumnKind::Boolean => match self.bar_chart(&column, outputs.stats) {
                    Ok(spec) => plan.specs.push(spec),
                    Err(e) => plan.notes.push(format!("bar:{}: skipped: {}", column.name, e)),
                },
                ColumnKind::Datetime | ColumnKind::Text => {}
            }
        }

        self.pairplot(view, &mut plan);

        let matrices = [
            (CorrelationMethod::Pearson, outputs.numeric),
            (CorrelationMethod::CramersV, outputs.categorical),
        ];
        for (method, matrix) in matrices {
            heatmap(method, matrix, &mut plan);
        }

        if let Some(matrix) = outputs.numeric {
            for pair in matrix.strong_pairs(self.config.high_correlation_threshold) {
                let columns = vec![pair.first.to_string(), pair.second.to_string()];
                let params = ChartParams {
                    method: Some(matrix.method),
                    coefficient: pair.coefficient.value(),
                    interactive: true,
                    ..Default::default()
                };
                let title = format!("{} vs {}", pair.first, pair.second);
                plan.specs
                    .push(VisualizationSpec::new(ChartKind::Scatter, columns, title).with_params(params));
            }
        }

        debug!(
            "Generated {} visualization specs ({} notes)",
            plan.specs.len(),
            plan.notes.len()
        );
        plan
    }

    fn histogram(&self, column: &ColumnRef<'_>, stats: Option<&StatsReport>) -> VisualizationSpec {
        let non_null = column.series.len() - column.null_count();
        let bins = self.config.histogram_bins.unwrap_or_else(|| sturges_bins(non_null));

        // A density estimate needs spread; fall back to the config when stats are missing
        let kde = self.config.kde
            && stats
                .and_then(|s| s.profiles.iter().find(|p| p.name == column.name))
                .map(|p| p.numeric.as_ref().is_some_and(|n| n.std.is_some_and(|s| s > 0.0)))
                .unwrap_or(true);

        let params = ChartParams {
            bins: Some(bins),
            kde: Some(kde),
            ..Default::default()
        };
        VisualizationSpec::new(
            ChartKind::Histogram,
            vec![column.name.to_string()],
            format!("Distribution of {}", column.name),
        )
        .with_params(params)
    }

    fn box_plot(&self, column: &ColumnRef<'_>, quality: Option<&QualityReport>) -> VisualizationSpec {
        let params = ChartParams {
            whisker_multiplier: Some(self.config.iqr_multiplier),
            outlier_count: quality
                .and_then(|q| q.outliers.get(column.name))
                .map(|o| o.iqr.count),
            ..Default::default()
        };
        VisualizationSpec::new(
            ChartKind::Box,
            vec![column.name.to_string()],
            format!("Spread of {}", column.name),
        )
        .with_params(params)
    }

    fn bar_chart(
        &self,
        column: &ColumnRef<'_>,
        stats: Option<&StatsReport>,
    ) -> crate::error::Result<VisualizationSpec> {
        let top_n = self.config.bar_chart_top_n;
        let profiled = stats
            .and_then(|s| s.profiles.iter().find(|p| p.name == column.name))
            .and_then(|p| p.categorical.as_ref().map(|c| (p.non_null_count, c)))
            .filter(|(_, c)| c.top_values.len() >= top_n || c.top_values.len() == c.distinct_count);

        let (non_null, distinct, categories) = match profiled {
            Some((non_null, summary)) => {
                let categories: Vec<CategoryFrequency> =
                    summary.top_values.iter().take(top_n).cloned().collect();
                (non_null, summary.distinct_count, categories)
            }
            None => self.count_categories(column)?,
        };
        let shown: usize = categories.iter().map(|c| c.count).sum();
        let lumped = distinct - categories.len();

        let params = ChartParams {
            top_n: Some(top_n),
            categories,
            lumped_categories: (lumped > 0).then_some(lumped),
            other_count: (lumped > 0).then(|| non_null.saturating_sub(shown)),
            other_label: (lumped > 0).then(|| OTHER_LABEL.to_string()),
            ..Default::default()
        };
        Ok(VisualizationSpec::new(
            ChartKind::Bar,
            vec![column.name.to_string()],
            format!("Categories of {}", column.name),
        )
        .with_params(params))
    }

    /// Ranks categories from the column itself, for when the stats profile is
    /// missing or holds fewer than `bar_chart_top_n` of them.
    fn count_categories(
        &self,
        column: &ColumnRef<'_>,
    ) -> crate::error::Result<(usize, usize, Vec<CategoryFrequency>)> {
        let values = column.string_values()?;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for value in values.into_iter().flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }
        let non_null: usize = counts.values().sum();
        let distinct = counts.len();

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let categories = ranked
            .into_iter()
            .take(self.config.bar_chart_top_n)
            .map(|(value, count)| CategoryFrequency {
                value,
                count,
                percent: percent(count, non_null),
            })
            .collect();
        Ok((non_null, distinct, categories))
    }

    fn pairplot(&self, view: &DatasetView, plan: &mut VisualizationPlan) {
        let columns: Vec<String> = view
            .numeric_columns()
            .iter()
            .map(|c| c.name.to_string())
            .collect();
        let limit = self.config.pairplot_max_columns;

        if columns.len() < 2 {
            plan.notes
                .push("pairplot skipped: fewer than two numeric columns".to_string());
        } else if columns.len() > limit {
            plan.notes.push(format!(
                "pairplot skipped: {} numeric columns exceed the limit of {}",
                columns.len(),
                limit
            ));
        } else {
            let params = ChartParams {
                kde: Some(self.config.kde),
                ..Default::default()
            };
            plan.specs.push(
                VisualizationSpec::new(ChartKind::Pairplot, columns, "Pairwise relationships")
                    .with_id("pairplot")
                    .with_params(params),
            );
        }
    }
}

/// One bar per column with missing values, tallest first.
fn missing_values(quality: &QualityReport, plan: &mut VisualizationPlan) {
    let mut missing: Vec<_> = quality
        .missing
        .columns
        .iter()
        .filter(|c| c.missing_count > 0)
        .collect();
    if missing.is_empty() {
        return;
    }
    missing.sort_by(|a, b| b.missing_count.cmp(&a.missing_count));

    let params = ChartParams {
        categories: missing
            .iter()
            .map(|c| CategoryFrequency {
                value: c.column.clone(),
                count: c.missing_count,
                percent: c.missing_percent,
            })
            .collect(),
        ..Default::default()
    };
    plan.specs.push(
        VisualizationSpec::new(
            ChartKind::Bar,
            missing.iter().map(|c| c.column.clone()).collect(),
            "Missing values by column",
        )
        .with_id("missing_values")
        .with_params(params),
    );
}

fn violin(column: &ColumnRef<'_>) -> VisualizationSpec {
    VisualizationSpec::new(
        ChartKind::Violin,
        vec![column.name.to_string()],
        format!("Density of {}", column.name),
    )
}

fn heatmap(
    method: CorrelationMethod,
    matrix: Option<&CorrelationMatrix>,
    plan: &mut VisualizationPlan,
) {
    let id = match method {
        CorrelationMethod::Pearson => "heatmap:pearson",
        CorrelationMethod::CramersV => "heatmap:cramers_v",
    };
    let Some(matrix) = matrix else {
        plan.notes
            .push(format!("{}: skipped: {} matrix unavailable", id, method));
        return;
    };
    if matrix.len() < 2 {
        plan.notes
            .push(format!("{}: skipped: fewer than two columns", id));
        return;
    }
    let params = ChartParams {
        method: Some(method),
        ..Default::default()
    };
    plan.specs.push(
        VisualizationSpec::new(
            ChartKind::Heatmap,
            matrix.columns.clone(),
            format!("{} correlation", method),
        )
        .with_id(id)
        .with_params(params),
    );
}

/// Sturges' rule: `ceil(log2(n)) + 1`, at least one bin.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationEngine;
    use crate::quality::QualityAnalyzer;
    use crate::stats::DescriptiveStatsEngine;
    use polars::prelude::*;

    fn view(df: DataFrame) -> DatasetView {
        DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap()
    }

    fn generate_all(view: &DatasetView, config: AnalysisConfig) -> VisualizationPlan {
        let quality = QualityAnalyzer::new(config.clone()).analyze(view).unwrap();
        let stats = DescriptiveStatsEngine::new(config.clone()).analyze(view).unwrap();
        let engine = CorrelationEngine::new();
        let numeric = engine.numeric_matrix(view).unwrap();
        let categorical = engine.categorical_matrix(view).unwrap();
        VisualizationGenerator::new(config).generate(
            view,
            AnalysisOutputs {
                quality: Some(&quality),
                stats: Some(&stats),
                numeric: Some(&numeric),
                categorical: Some(&categorical),
            },
        )
    }

    fn ids(plan: &VisualizationPlan) -> Vec<&str> {
        plan.specs.iter().map(|s| s.id.as_str()).collect()
    }

    // ==================== ordering tests ====================

    #[test]
    fn test_spec_order() {
        let df = df![
            "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
            "color" => ["red", "blue", "red", "blue", "red", "blue"],
            "y" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.5],
            "size" => ["s", "l", "s", "l", "s", "l"],
        ]
        .unwrap();
        let plan = generate_all(&view(df), AnalysisConfig::default());

        assert_eq!(
            ids(&plan),
            vec![
                "histogram:x",
                "box:x",
                "violin:x",
                "bar:color",
                "histogram:y",
                "box:y",
                "violin:y",
                "bar:size",
                "pairplot",
                "heatmap:pearson",
                "heatmap:cramers_v",
                "scatter:x:y",
            ]
        );
        assert!(plan.notes.is_empty());

        let scatter = plan.of_kind(ChartKind::Scatter).next().unwrap();
        assert!(scatter.params.interactive);
        assert!(scatter.params.coefficient.unwrap() > 0.99);
    }

    // ==================== per-chart parameter tests ====================

    #[test]
    fn test_histogram_bins_and_kde() {
        let df = df![
            "x" => (1..=16).map(|v| v as f64).collect::<Vec<_>>(),
            "flat" => vec![3.0f64; 16],
        ]
        .unwrap();
        let plan = generate_all(&view(df), AnalysisConfig::default());
        let histograms: Vec<_> = plan.of_kind(ChartKind::Histogram).collect();

        assert_eq!(histograms[0].params.bins, Some(5));
        assert_eq!(histograms[0].params.kde, Some(true));
        assert_eq!(histograms[1].params.kde, Some(false));

        let config = AnalysisConfig::builder().histogram_bins(12).build().unwrap();
        let df = df!["x" => [1.0f64, 2.0, 3.0]].unwrap();
        let plan = generate_all(&view(df), config);
        assert_eq!(plan.specs[0].params.bins, Some(12));
    }

    #[test]
    fn test_box_plot_carries_outlier_count() {
        let df = df!["v" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 100.0]].unwrap();
        let plan = generate_all(&view(df), AnalysisConfig::default());
        let box_plot = plan.of_kind(ChartKind::Box).next().unwrap();
        assert_eq!(box_plot.params.outlier_count, Some(1));
        assert_eq!(box_plot.params.whisker_multiplier, Some(1.5));
    }

    #[test]
    fn test_bar_chart_lumps_other() {
        let mut values = Vec::new();
        for (label, count) in [("a", 5), ("b", 4), ("c", 3), ("d", 2), ("e", 1)] {
            values.extend(std::iter::repeat_n(label, count));
        }
        let df = df!["letter" => values].unwrap();
        let config = AnalysisConfig::builder().bar_chart_top_n(2).build().unwrap();
        let plan = generate_all(&view(df), config);

        let bar = plan.of_kind(ChartKind::Bar).next().unwrap();
        let shown: Vec<&str> = bar.params.categories.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(shown, vec!["a", "b"]);
        assert_eq!(bar.params.lumped_categories, Some(3));
        assert_eq!(bar.params.other_count, Some(6));
        assert_eq!(bar.params.other_label.as_deref(), Some(OTHER_LABEL));
    }

    #[test]
    fn test_bar_chart_without_lumping() {
        let df = df!["flag" => [true, false, true, true]].unwrap();
        let plan = generate_all(&view(df), AnalysisConfig::default());
        let bar = plan.of_kind(ChartKind::Bar).next().unwrap();
        assert_eq!(bar.params.categories.len(), 2);
        assert_eq!(bar.params.categories[0].value, "true");
        assert!(bar.params.other_label.is_none());
    }

    #[test]
    fn test_bar_chart_reads_profiled_frequencies() {
        let df = df!["color" => ["red", "red", "blue", "green", "red", "blue"]].unwrap();
        let view = view(df);
        let config = AnalysisConfig::default();
        let mut stats = DescriptiveStatsEngine::new(config.clone()).analyze(&view).unwrap();
        let summary = stats.profiles[0].categorical.as_mut().unwrap();
        assert_eq!(summary.distinct_count, 3);
        summary.top_values[0].count = 5;

        let plan = VisualizationGenerator::new(config).generate(
            &view,
            AnalysisOutputs {
                stats: Some(&stats),
                ..Default::default()
            },
        );
        let bar = plan.of_kind(ChartKind::Bar).next().unwrap();
        assert_eq!(bar.params.categories[0].value, "red");
        assert_eq!(bar.params.categories[0].count, 5);
    }

    #[test]
    fn test_bar_chart_recounts_when_profile_is_short() {
        let mut values = Vec::new();
        for (label, count) in [("a", 4), ("b", 3), ("c", 2), ("d", 1)] {
            values.extend(std::iter::repeat_n(label, count));
        }
        let df = df!["letter" => values].unwrap();
        let config = AnalysisConfig::builder()
            .top_k_categories(1)
            .bar_chart_top_n(3)
            .build()
            .unwrap();
        let plan = generate_all(&view(df), config);

        let bar = plan.of_kind(ChartKind::Bar).next().unwrap();
        let shown: Vec<&str> = bar.params.categories.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(shown, vec!["a", "b", "c"]);
        assert_eq!(bar.params.lumped_categories, Some(1));
        assert_eq!(bar.params.other_count, Some(1));
    }

    #[test]
    fn test_missing_values_chart_leads_plan() {
        let df = df![
            "x" => [Some(1.0f64), None, Some(3.0), None],
            "label" => [Some("a"), Some("b"), None, Some("a")],
            "full" => [1.0f64, 2.0, 3.0, 4.0],
        ]
        .unwrap();
        let plan = generate_all(&view(df), AnalysisConfig::default());

        let chart = &plan.specs[0];
        assert_eq!(chart.id, "missing_values");
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.columns, vec!["x", "label"]);
        let counts: Vec<usize> = chart.params.categories.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(chart.params.categories[0].percent, 50.0);
    }

    #[test]
    fn test_no_missing_values_chart_for_complete_data() {
        let df = df!["x" => [1.0f64, 2.0, 3.0]].unwrap();
        let plan = generate_all(&view(df), AnalysisConfig::default());
        assert!(plan.specs.iter().all(|s| s.id != "missing_values"));
    }

    // ==================== skipped chart tests ====================

    #[test]
    fn test_pairplot_ceiling() {
        let config = AnalysisConfig::builder().pairplot_max_columns(2).build().unwrap();
        let df = df![
            "a" => [1.0f64, 2.0, 3.0],
            "b" => [3.0f64, 1.0, 2.0],
            "c" => [2.0f64, 3.0, 1.0],
        ]
        .unwrap();
        let plan = generate_all(&view(df), config);
        assert_eq!(plan.of_kind(ChartKind::Pairplot).count(), 0);
        assert!(plan.notes.iter().any(|n| n.contains("exceed the limit of 2")));
    }

    #[test]
    fn test_single_numeric_column_skips_joint_charts() {
        let df = df!["v" => [50.0f64, 50.0, 50.0]].unwrap();
        let plan = generate_all(&view(df), AnalysisConfig::default());
        assert_eq!(ids(&plan), vec!["histogram:v", "box:v", "violin:v"]);
        assert_eq!(plan.notes.len(), 3);
    }

    #[test]
    fn test_missing_matrices_are_noted() {
        let df = df!["a" => [1.0f64, 2.0], "b" => [2.0f64, 1.0]].unwrap();
        let plan = VisualizationGenerator::new(AnalysisConfig::default())
            .generate(&view(df), AnalysisOutputs::default());
        assert_eq!(plan.of_kind(ChartKind::Heatmap).count(), 0);
        assert!(plan.notes.iter().any(|n| n.contains("Pearson matrix unavailable")));
        assert_eq!(plan.of_kind(ChartKind::Histogram).count(), 2);
    }

    #[test]
    fn test_sturges_bins() {
        assert_eq!(sturges_bins(0), 1);
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(2), 2);
        assert_eq!(sturges_bins(100), 8);
    }
}
