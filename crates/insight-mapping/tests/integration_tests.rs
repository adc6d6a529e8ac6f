//! Integration tests for the analysis pipeline.
//!
//! These tests drive the public API end-to-end: loading, analysis, report
//! assembly and serialization.

use insight_mapping::correlation::UndefinedReason;
use insight_mapping::dataset::loader::load_dataset;
use insight_mapping::reporting::{REPORT_KEYS, StageOutputs};
use insight_mapping::visualization::{AnalysisOutputs, ChartKind};
use insight_mapping::{
    AnalysisConfig, AnalysisError, AnalysisPipeline, CancellationToken, Coefficient, ColumnKind,
    CorrelationEngine, CorrelationMatrix, DatasetView, DescriptiveStatsEngine, QualityAnalyzer,
    Report, ReportAssembler, ReportWriter, Section, SectionStatus, VisualizationGenerator,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn customers() -> DatasetView {
    let (df, _) = load_dataset(fixtures_path().join("customers.csv")).expect("Failed to load fixture");
    DatasetView::from_dataframe(df, &AnalysisConfig::default())
        .expect("Fixture violates the dataset contract")
        .with_name("customers")
}

fn run(view: &DatasetView) -> Report {
    AnalysisPipeline::builder()
        .build()
        .unwrap()
        .run(view)
        .expect("Pipeline failed")
}

fn assert_matrix_invariants(matrix: &CorrelationMatrix) {
    let (low, high) = matrix.method.range();
    assert!(matrix.is_symmetric(), "{} matrix is not symmetric", matrix.method);
    for a in &matrix.columns {
        for b in &matrix.columns {
            assert_eq!(matrix.get(a, b), matrix.get(b, a));
            if let Some(value) = matrix.get(a, b).and_then(|c| c.value()) {
                assert!(
                    (low..=high).contains(&value),
                    "{} for ({}, {}) out of range: {}",
                    matrix.method,
                    a,
                    b,
                    value
                );
            }
        }
    }
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_on_fixture() {
    let view = customers();
    assert_eq!(view.height(), 21);
    assert_eq!(
        view.kinds(),
        &[
            ColumnKind::Numeric,
            ColumnKind::Numeric,
            ColumnKind::Numeric,
            ColumnKind::Categorical,
            ColumnKind::Boolean,
            ColumnKind::Datetime,
            ColumnKind::Categorical,
        ]
    );

    let report = run(&view);
    assert!(report.is_complete());
    assert_eq!(report.metadata.dataset_name, "customers");
    assert_eq!(report.metadata.row_count, 21);
    assert_eq!(report.metadata.column_count, 7);

    let profiles = report.column_profiles.as_ref().unwrap();
    let names: Vec<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["age", "income", "spend", "segment", "churned", "signup_date", "region"]
    );

    let quality = report.quality.as_ref().unwrap();
    assert_eq!(quality.duplicates.row_count, 1);
    assert!((0.0..=100.0).contains(&quality.score.score));

    // The NA sentinel and the empty CSV field are both missing
    let income = quality.missing.columns.iter().find(|c| c.column == "income").unwrap();
    assert_eq!(income.missing_count, 1);
    let segment = quality.missing.columns.iter().find(|c| c.column == "segment").unwrap();
    assert_eq!(segment.missing_count, 1);

    // income has a 250k outlier
    let income_outliers = quality.outliers.get("income").unwrap();
    assert!(income_outliers.iqr.count >= 1);

    let numeric = report.correlation_numeric.as_ref().unwrap();
    assert_eq!(numeric.columns, vec!["age", "income", "spend"]);
    assert!(numeric.get("age", "spend").unwrap().value().unwrap() > 0.9);

    let categorical = report.correlation_categorical.as_ref().unwrap();
    assert_eq!(categorical.columns, vec!["segment", "churned", "region"]);

    let visuals = report.visualizations.as_ref().unwrap();
    assert!(visuals.iter().any(|s| s.kind == ChartKind::Pairplot));
    assert_eq!(visuals.iter().filter(|s| s.kind == ChartKind::Heatmap).count(), 2);
    assert!(visuals.iter().any(|s| s.id == "scatter:age:spend"));

    let missing_chart = visuals.iter().find(|s| s.id == "missing_values").unwrap();
    assert_eq!(missing_chart.kind, ChartKind::Bar);
    assert_eq!(missing_chart.columns, vec!["age", "income", "spend", "segment"]);
    assert!(missing_chart.params.categories.iter().all(|c| c.count == 1));
}

#[test]
fn test_missing_counts_are_consistent() {
    let report = run(&customers());

    for profile in report.column_profiles.as_ref().unwrap() {
        assert!((0.0..=100.0).contains(&profile.missing_percent));
        assert_eq!(profile.non_null_count + profile.missing_count, profile.row_count);
    }
    for column in &report.quality.as_ref().unwrap().missing.columns {
        assert!((0.0..=100.0).contains(&column.missing_percent));
        assert_eq!(column.non_null_count + column.missing_count, 21);
    }
}

#[test]
fn test_correlation_matrices_are_symmetric_and_bounded() {
    let report = run(&customers());
    assert_matrix_invariants(report.correlation_numeric.as_ref().unwrap());
    assert_matrix_invariants(report.correlation_categorical.as_ref().unwrap());
}

// ============================================================================
// Serialization Tests
// ============================================================================

#[test]
fn test_json_round_trip_and_determinism() {
    let report = run(&customers());

    let first = report.to_json().unwrap();
    let second = report.to_json().unwrap();
    assert_eq!(first, second);

    let parsed = Report::from_json(&first).unwrap();
    assert_eq!(parsed, report);
    assert_eq!(parsed.to_json().unwrap(), first);

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    let mut expected = REPORT_KEYS.to_vec();
    expected.sort_unstable();
    assert_eq!(keys, expected);
}

#[test]
fn test_report_writer_outputs() {
    let report = run(&customers());
    let dir = std::env::temp_dir().join(format!("insight_mapping_writer_{}", std::process::id()));

    let written = ReportWriter::new(&dir).write(&report).unwrap();
    let json = std::fs::read_to_string(&written.json).unwrap();
    assert_eq!(Report::from_json(&json).unwrap(), report);

    let html = std::fs::read_to_string(&written.html).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    for section in Section::ALL {
        assert!(html.contains(&format!("id=\"{}\"", section.key())));
    }

    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Degenerate Data Tests
// ============================================================================

#[test]
fn test_constant_column() {
    let df = df![
        "constant" => vec![50.0f64; 12],
        "tenth" => vec![0.1f64; 12],
        "x" => (0..12).map(|v| v as f64).collect::<Vec<_>>(),
    ]
    .unwrap();
    let view = DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap();
    let report = run(&view);

    let profiles = report.column_profiles.as_ref().unwrap();
    let matrix = report.correlation_numeric.as_ref().unwrap();
    let undefined = Coefficient::undefined(UndefinedReason::ZeroVariance);

    // 0.1 has no exact binary form; repeated copies must still have zero spread
    for name in ["constant", "tenth"] {
        let profile = profiles.iter().find(|p| p.name == name).unwrap();
        let numeric = profile.numeric.as_ref().unwrap();
        assert_eq!(numeric.std, Some(0.0), "std of {}", name);
        assert_eq!(numeric.variance, Some(0.0), "variance of {}", name);
        assert_eq!(numeric.iqr, Some(0.0), "iqr of {}", name);

        assert_eq!(matrix.get(name, name), Some(&undefined));
        assert_eq!(matrix.get(name, "x"), Some(&undefined));

        let outliers = report.quality.as_ref().unwrap().outliers.get(name).unwrap();
        assert_eq!(outliers.iqr.count, 0);
        assert_eq!(outliers.zscore.count, 0);
    }

    // Degraded, not failed
    assert!(report.is_complete());
    assert_eq!(
        report.section(Section::CorrelationNumeric).unwrap().status,
        SectionStatus::Degraded
    );
}

#[test]
fn test_extreme_magnitudes_survive_json_round_trip() {
    let df = df![
        "x" => [1e200f64, -1e200, 0.0, 1.0],
        "y" => [1i64, 2, 3, 4],
    ]
    .unwrap();
    let view = DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap();
    let report = run(&view);

    let json = report.to_json().unwrap();
    assert_eq!(Report::from_json(&json).unwrap(), report);

    let x = report.column_profiles.as_ref().unwrap()[0].numeric.as_ref().unwrap();
    // The variance is past f64::MAX but its square root is not
    assert_eq!(x.variance, None);
    assert!(x.std.is_some_and(f64::is_finite));
    assert!(x.mean.is_finite());

    let r = report
        .correlation_numeric
        .as_ref()
        .unwrap()
        .get("x", "y")
        .unwrap()
        .value()
        .unwrap();
    assert!((-1.0..=1.0).contains(&r));
    assert_matrix_invariants(report.correlation_numeric.as_ref().unwrap());
}

#[test]
fn test_infinite_values_are_missing() {
    let df = df![
        "reading" => [1.0f64, f64::INFINITY, 3.0, f64::NEG_INFINITY, 5.0, f64::NAN],
        "parsed" => ["1.5", "inf", "2.5", "-inf", "3.5", "4.5"],
    ]
    .unwrap();
    let view = DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap();
    let report = run(&view);

    let profiles = report.column_profiles.as_ref().unwrap();
    assert_eq!(profiles[0].missing_count, 3);
    assert_eq!(profiles[0].numeric.as_ref().unwrap().max, 5.0);
    assert_eq!(profiles[1].kind, ColumnKind::Numeric);
    assert_eq!(profiles[1].missing_count, 2);

    let json = report.to_json().unwrap();
    assert_eq!(Report::from_json(&json).unwrap(), report);
}

#[test]
fn test_nested_json_fields() {
    let (df, _) = load_dataset(fixtures_path().join("orders.json")).expect("Failed to load fixture");
    let view = DatasetView::from_dataframe(df, &AnalysisConfig::default())
        .expect("Nested fields violate the dataset contract")
        .with_name("orders");
    let report = run(&view);

    assert!(report.is_complete());
    assert_ne!(
        report.section(Section::Quality).unwrap().status,
        SectionStatus::Failed
    );

    let profiles = report.column_profiles.as_ref().unwrap();
    for name in ["tags", "address"] {
        let profile = profiles.iter().find(|p| p.name == name).unwrap();
        assert!(
            matches!(profile.kind, ColumnKind::Categorical | ColumnKind::Text),
            "{} classified as {:?}",
            name,
            profile.kind
        );
    }
    let tags = profiles.iter().find(|p| p.name == "tags").unwrap();
    assert_eq!(tags.missing_count, 1);

    // Orders 1 and 7 differ only by id
    let quality = report.quality.as_ref().unwrap();
    assert_eq!(quality.duplicates.row_count, 0);

    let json = report.to_json().unwrap();
    assert_eq!(Report::from_json(&json).unwrap(), report);
}

#[test]
fn test_ten_duplicate_rows_in_hundred() {
    let mut ids: Vec<i64> = (0..90).collect();
    ids.extend(0..10);
    let labels: Vec<String> = ids.iter().map(|i| format!("item-{}", i % 7)).collect();
    let df = df!["id" => ids, "label" => labels].unwrap();
    let view = DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap();

    let quality = QualityAnalyzer::new(AnalysisConfig::default()).analyze(&view).unwrap();
    assert_eq!(quality.duplicates.row_count, 10);
    assert_eq!(quality.duplicates.percent, 10.0);
}

#[test]
fn test_outlier_methods_reported_independently() {
    let df = df!["v" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 100.0]].unwrap();
    let view = DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap();
    let quality = QualityAnalyzer::new(AnalysisConfig::default()).analyze(&view).unwrap();

    let column = quality.outliers.get("v").unwrap();
    assert_eq!(column.iqr.indices, vec![5]);
    assert_eq!(column.iqr.multiplier, 1.5);
    // With population std the largest |z| is about 2.2
    assert_eq!(column.zscore.threshold, 3.0);
    assert_eq!(column.zscore.count, 0);
}

#[test]
fn test_perfectly_associated_categories() {
    let left: Vec<&str> = (0..50).map(|i| if i % 2 == 0 { "on" } else { "off" }).collect();
    let right: Vec<&str> = (0..50).map(|i| if i % 2 == 0 { "high" } else { "low" }).collect();
    let df = df!["switch" => left, "level" => right].unwrap();
    let view = DatasetView::from_dataframe(df, &AnalysisConfig::default()).unwrap();

    let matrix = CorrelationEngine::new().categorical_matrix(&view).unwrap();
    let v = matrix.get("switch", "level").unwrap().value().unwrap();
    assert!((v - 1.0).abs() < 1e-9);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_contract_violations_are_fatal() {
    let config = AnalysisConfig::default();

    let ragged = vec![
        Series::new("a".into(), &[1.0f64, 2.0, 3.0]),
        Series::new("b".into(), &[1.0f64, 2.0]),
    ];
    let err = DatasetView::from_series(ragged, &config).unwrap_err();
    assert!(matches!(err, AnalysisError::RaggedColumns { .. }));
    assert!(err.is_fatal());

    let duplicated = vec![
        Series::new("a".into(), &[1.0f64]),
        Series::new("a".into(), &[2.0f64]),
    ];
    let err = DatasetView::from_series(duplicated, &config).unwrap_err();
    assert!(matches!(err, AnalysisError::DuplicateColumn(ref name) if name == "a"));
    assert!(err.is_fatal());
}

#[test]
fn test_cancelled_pipeline_produces_no_report() {
    let token = CancellationToken::new();
    token.cancel();

    let result = AnalysisPipeline::builder()
        .cancellation_token(token)
        .build()
        .unwrap()
        .run(&customers());

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.error_code(), "CANCELLED");
}

#[test]
fn test_partial_report_marks_failed_section() {
    let view = customers();
    let config = AnalysisConfig::default();
    let quality = QualityAnalyzer::new(config.clone()).analyze(&view).unwrap();
    let stats = DescriptiveStatsEngine::new(config.clone()).analyze(&view).unwrap();
    let categorical = CorrelationEngine::new().categorical_matrix(&view).unwrap();
    let plan = VisualizationGenerator::new(config).generate(
        &view,
        AnalysisOutputs {
            quality: Some(&quality),
            stats: Some(&stats),
            numeric: None,
            categorical: Some(&categorical),
        },
    );

    let report = ReportAssembler::new().assemble(
        &view,
        StageOutputs {
            quality: Ok(quality),
            stats: Ok(stats),
            correlation_numeric: Err(AnalysisError::stage_failed("correlation", "worker lost")),
            correlation_categorical: Ok(categorical),
            visualizations: Ok(plan),
        },
    );

    assert!(!report.is_complete());
    assert_eq!(report.failed_sections(), vec![Section::CorrelationNumeric]);
    assert!(report.correlation_numeric.is_none());

    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["correlation_numeric"].is_null());
    assert_eq!(value["metadata"]["complete"], serde_json::json!(false));
    assert_eq!(Report::from_json(&json).unwrap(), report);

    let html = report.to_html();
    assert!(html.contains("Section omitted"));
    assert!(html.contains("worker lost"));
}

#[test]
fn test_unsupported_format() {
    let err = load_dataset(fixtures_path().join("customers.xlsx")).unwrap_err();
    // Missing files are reported before the extension is checked
    assert_eq!(err.error_code(), "IO_ERROR");

    let err = insight_mapping::dataset::loader::FileFormat::from_path(std::path::Path::new(
        "book.xlsx",
    ))
    .unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
}
