//! HTML projection of a [`Report`].

use super::report::{Report, Section, SectionOutcome, SectionStatus};
use crate::correlation::{Coefficient, CorrelationMatrix};
use crate::quality::QualityReport;
use crate::stats::ColumnProfile;
use crate::visualization::VisualizationSpec;

const STYLE: &str = "body{font-family:sans-serif;margin:2em;color:#222}\
table{border-collapse:collapse;margin:1em 0}\
td,th{border:1px solid #ccc;padding:4px 8px;text-align:right}\
th:first-child,td:first-child{text-align:left}\
nav a{margin-right:1em}\
.complete{color:#2a7d2a}.degraded{color:#b8860b}.failed{color:#b22222}\
.undefined{color:#888;font-style:italic}";

impl Report {
    /// Render a standalone HTML document with one anchor per section.
    pub fn to_html(&self) -> String {
        let meta = &self.metadata;
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>EDA report: {}</title>\n<style>{}</style>\n</head>\n<body>\n",
            escape(&meta.dataset_name),
            STYLE
        ));
        html.push_str(&format!("<h1>EDA report: {}</h1>\n", escape(&meta.dataset_name)));

        html.push_str("<nav><a href=\"#summary\">Summary</a>");
        for section in Section::ALL {
            html.push_str(&format!(
                "<a href=\"#{}\">{}</a>",
                section.key(),
                section.title()
            ));
        }
        html.push_str("</nav>\n");

        self.summary_html(&mut html);

        for section in Section::ALL {
            html.push_str(&format!(
                "<section id=\"{}\">\n<h2>{}</h2>\n",
                section.key(),
                section.title()
            ));
            let body = match section {
                Section::ColumnProfiles => self.column_profiles.as_deref().map(profiles_html),
                Section::Quality => self.quality.as_ref().map(quality_html),
                Section::CorrelationNumeric => self.correlation_numeric.as_ref().map(matrix_html),
                Section::CorrelationCategorical => {
                    self.correlation_categorical.as_ref().map(matrix_html)
                }
                Section::Visualizations => self.visualizations.as_deref().map(visualizations_html),
            };
            match body {
                Some(body) => html.push_str(&body),
                None => {
                    let reason = self
                        .section(section)
                        .and_then(|s| s.error.as_ref())
                        .map(|e| e.message.as_str())
                        .unwrap_or("not produced");
                    html.push_str(&format!(
                        "<p class=\"failed\">Section omitted: {}</p>\n",
                        escape(reason)
                    ));
                }
            }
            html.push_str("</section>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    fn summary_html(&self, html: &mut String) {
        let meta = &self.metadata;
        html.push_str("<section id=\"summary\">\n<h2>Summary</h2>\n<table>\n");
        let rows = [
            ("Rows", meta.row_count.to_string()),
            ("Columns", meta.column_count.to_string()),
            ("Memory (bytes)", meta.memory_bytes.to_string()),
            ("Loaded at", meta.loaded_at.to_rfc3339()),
            ("Generated at", meta.generated_at.to_rfc3339()),
            (
                "Engine",
                format!("{} {}", meta.engine.name, meta.engine.version),
            ),
            ("Schema version", self.schema_version.clone()),
            (
                "Report",
                if meta.complete { "complete" } else { "incomplete" }.to_string(),
            ),
        ];
        for (label, value) in rows {
            html.push_str(&format!("<tr><th>{}</th><td>{}</td></tr>\n", label, escape(&value)));
        }
        for (kind, count) in &meta.column_kinds {
            html.push_str(&format!("<tr><th>{} columns</th><td>{}</td></tr>\n", kind, count));
        }
        html.push_str("</table>\n<h3>Section status</h3>\n<table>\n<tr><th>Section</th><th>Status</th><th>Details</th></tr>\n");
        for outcome in &meta.sections {
            html.push_str(&outcome_row(outcome));
        }
        html.push_str("</table>\n</section>\n");
    }
}

fn outcome_row(outcome: &SectionOutcome) -> String {
    let details = match (&outcome.error, outcome.status) {
        (Some(error), _) => format!("{}: {}", error.code, error.message),
        (None, SectionStatus::Degraded) => outcome.notes.join("; "),
        (None, _) => String::new(),
    };
    format!(
        "<tr><td><a href=\"#{key}\">{title}</a></td><td class=\"{status}\">{status}</td><td>{details}</td></tr>\n",
        key = outcome.section.key(),
        title = outcome.section.title(),
        status = outcome.status,
        details = escape(&details)
    )
}

fn quality_html(quality: &QualityReport) -> String {
    let score = &quality.score;
    let mut html = format!(
        "<p>Quality score: <strong>{:.1}</strong> / 100 (completeness {:.1}, uniqueness {:.1}, outlier cleanliness {:.1})</p>\n",
        score.score, score.completeness, score.uniqueness, score.outlier_cleanliness
    );

    html.push_str("<h3>Missing values</h3>\n<table>\n<tr><th>Column</th><th>Missing</th><th>%</th></tr>\n");
    for column in &quality.missing.columns {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
            escape(&column.column),
            column.missing_count,
            column.missing_percent
        ));
    }
    html.push_str("</table>\n");

    let duplicates = &quality.duplicates;
    html.push_str(&format!(
        "<h3>Duplicates</h3>\n<p>{} duplicate rows ({:.2}%) of {}.</p>\n",
        duplicates.row_count, duplicates.percent, duplicates.total_rows
    ));
    if !duplicates.column_pairs.is_empty() {
        html.push_str("<ul>\n");
        for pair in &duplicates.column_pairs {
            html.push_str(&format!(
                "<li>{} duplicates {}</li>\n",
                escape(&pair.second),
                escape(&pair.first)
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<h3>Outliers</h3>\n<table>\n<tr><th>Column</th><th>IQR count</th><th>IQR bounds</th><th>Z-score count</th><th>Z threshold</th></tr>\n");
    for column in &quality.outliers.columns {
        let bounds = match (column.iqr.lower_bound, column.iqr.upper_bound) {
            (Some(low), Some(high)) => format!("[{:.4}, {:.4}]", low, high),
            _ => "n/a".to_string(),
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&column.column),
            column.iqr.count,
            bounds,
            column.zscore.count,
            column.zscore.threshold
        ));
    }
    html.push_str("</table>\n");
    html
}

fn profiles_html(profiles: &[ColumnProfile]) -> String {
    let mut html = String::from(
        "<table>\n<tr><th>Column</th><th>Kind</th><th>Non-null</th><th>Missing %</th><th>Unique</th><th>Mean</th><th>Std</th><th>Min</th><th>Max</th><th>Top value</th></tr>\n",
    );
    for profile in profiles {
        let numeric = profile.numeric.as_ref();
        let cell = |value: Option<f64>| value.map(|v| format!("{:.4}", v)).unwrap_or_default();
        let top = profile
            .categorical
            .as_ref()
            .and_then(|c| c.top_values.first())
            .map(|f| format!("{} ({})", f.value, f.count))
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&profile.name),
            profile.kind,
            profile.non_null_count,
            profile.missing_percent,
            profile.unique_count,
            cell(numeric.map(|n| n.mean)),
            cell(numeric.and_then(|n| n.std)),
            cell(numeric.map(|n| n.min)),
            cell(numeric.map(|n| n.max)),
            escape(&top)
        ));
    }
    html.push_str("</table>\n");
    html
}

fn matrix_html(matrix: &CorrelationMatrix) -> String {
    if matrix.is_empty() {
        return format!("<p>No columns eligible for {}.</p>\n", matrix.method);
    }
    let mut html = format!("<p>Method: {}</p>\n<table>\n<tr><th></th>", matrix.method);
    for column in &matrix.columns {
        html.push_str(&format!("<th>{}</th>", escape(column)));
    }
    html.push_str("</tr>\n");
    for (column, row) in matrix.columns.iter().zip(&matrix.cells) {
        html.push_str(&format!("<tr><th>{}</th>", escape(column)));
        for cell in row {
            match cell {
                Coefficient::Defined { value } => html.push_str(&format!("<td>{:.3}</td>", value)),
                Coefficient::Undefined { reason } => html.push_str(&format!(
                    "<td class=\"undefined\" title=\"{}\">undefined</td>",
                    reason
                )),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

fn visualizations_html(specs: &[VisualizationSpec]) -> String {
    let mut html = String::from("<ul>\n");
    for spec in specs {
        let target = match &spec.artifact {
            Some(artifact) => format!(
                " <a href=\"{}\">{}</a>",
                escape(artifact),
                escape(artifact)
            ),
            None => String::new(),
        };
        html.push_str(&format!(
            "<li id=\"{}\">{} <strong>{}</strong> ({}){}</li>\n",
            escape(&spec.id),
            spec.kind,
            escape(&spec.title),
            escape(&spec.columns.join(", ")),
            target
        ));
    }
    html.push_str("</ul>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }
}
