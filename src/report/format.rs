//! Formatted terminal output for ingest, training and analysis.
//!
//! Formatting lives here so pipeline code returns plain values and output
//! changes stay localized.

use crate::analysis::{DatasetSummary, GradeBreakdown};
use crate::app::pipeline::{TargetReport, TrainingReport};
use crate::fit::SearchResult;
use crate::io::{IngestedData, IngestionOutput};
use crate::math::RegressionMetrics;

const RULE: &str = "==================================================";

/// Maximum number of row errors echoed to the terminal.
const MAX_ROW_ERRORS: usize = 10;

pub fn format_metrics(label: &str, m: &RegressionMetrics) -> String {
    format!(
        "{label} set performance:\n - MAE: {:.4}\n - RMSE: {:.4}\n - R2: {:.4}\n",
        m.mae, m.rmse, m.r2
    )
}

/// One family's search outcome: winner, CV score, train/test metrics.
pub fn format_search_result(result: &SearchResult) -> String {
    let best = result.best();
    let mut out = String::new();
    out.push_str(&format!(
        "{} Best Hyperparameters: {}\n",
        result.family.display_name(),
        best.params.describe()
    ));
    out.push_str(&format!(
        "CV mean R2 ({} grid points): {:.4}\n",
        result.scores.len(),
        best.mean_score
    ));
    out.push_str(&format_metrics("Training", &result.train_metrics));
    out.push('\n');
    out.push_str(&format_metrics("Test", &result.test_metrics));
    out.push_str(RULE);
    out.push('\n');
    out
}

pub fn format_target_report(report: &TargetReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} prediction ===\n\n",
        report.target.display_name()
    ));
    for search in &report.searches {
        out.push_str(&format_search_result(search));
        out.push('\n');
    }

    let p = &report.production;
    out.push_str(&format!("Production model: {}\n", p.params));
    out.push_str(&format_metrics("Training", &p.train_metrics));
    out.push_str(&format_metrics("Test", &p.test_metrics));
    out.push_str(&format!("Saved: {}\n", p.path.display()));
    out
}

pub fn format_ingest_summary(ingest: &IngestedData) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Dataset: {} | rows read={} used={} skipped={}\n",
        ingest.source.display(),
        ingest.rows_read,
        ingest.rows_used(),
        ingest.row_errors.len()
    ));
    for err in ingest.row_errors.iter().take(MAX_ROW_ERRORS) {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > MAX_ROW_ERRORS {
        out.push_str(&format!(
            "  ... {} more\n",
            ingest.row_errors.len() - MAX_ROW_ERRORS
        ));
    }
    out
}

pub fn format_ingestion(output: &IngestionOutput) -> String {
    let mut out = format_ingest_summary(&output.ingest);
    out.push_str(&format!(
        "Train: {} rows -> {}\n",
        output.train.len(),
        output.train_path.display()
    ));
    out.push_str(&format!(
        "Test : {} rows -> {}\n",
        output.test.len(),
        output.test_path.display()
    ));
    out
}

/// Full `gem train` summary.
pub fn format_training_summary(report: &TrainingReport) -> String {
    let mut out = String::new();
    out.push_str("=== gem - model training ===\n");
    out.push_str(&format_ingestion(&report.ingestion));
    out.push('\n');
    for target in &report.targets {
        out.push_str(&format_target_report(target));
        out.push('\n');
    }
    out
}

fn format_breakdown(b: &GradeBreakdown) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<10} {:>8} {:>12}\n", b.column, "rows", "avg price"));
    out.push_str(&format!("{:-<10} {:-<8} {:-<12}\n", "", "", ""));
    for level in &b.levels {
        let price = level
            .mean_price
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:<10} {:>8} {:>12}\n", level.label, level.count, price));
    }
    out
}

pub fn format_dataset_summary(summary: &DatasetSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Rows: {} | price=[{:.0}, {:.0}] mean={:.2} | mean carat={:.3}\n\n",
        summary.n_rows, summary.price_min, summary.price_max, summary.price_mean, summary.carat_mean
    ));
    for b in [&summary.cut, &summary.color, &summary.clarity] {
        out.push_str(&format_breakdown(b));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelFamily, Target};
    use crate::fit::GridPointScore;
    use crate::models::{KnnParams, ModelParams};

    fn metrics(v: f64) -> RegressionMetrics {
        RegressionMetrics {
            mae: v,
            rmse: v * 2.0,
            r2: 0.5,
        }
    }

    #[test]
    fn search_result_uses_hyperparameter_layout() {
        let result = SearchResult {
            family: ModelFamily::Knn,
            target: Target::Price,
            scores: vec![
                GridPointScore {
                    params: ModelParams::Knn(KnnParams { n_neighbors: 3 }),
                    fold_scores: vec![0.8],
                    mean_score: 0.8,
                },
                GridPointScore {
                    params: ModelParams::Knn(KnnParams { n_neighbors: 5 }),
                    fold_scores: vec![0.9],
                    mean_score: 0.9,
                },
            ],
            best_index: 1,
            train_metrics: metrics(1.0),
            test_metrics: metrics(2.0),
        };

        let txt = format_search_result(&result);
        assert!(txt.starts_with("K-Neighbors Regressor Best Hyperparameters: n_neighbors=5\n"));
        assert!(txt.contains("Training set performance:\n - MAE: 1.0000\n - RMSE: 2.0000\n - R2: 0.5000\n"));
        assert!(txt.contains("Test set performance:\n - MAE: 2.0000"));
        assert!(txt.ends_with(&format!("{RULE}\n")));
    }

    #[test]
    fn ingest_summary_truncates_row_errors() {
        let ingest = IngestedData {
            source: "d.csv".into(),
            records: Vec::new(),
            row_errors: (0..12)
                .map(|i| crate::io::RowError {
                    line: i + 2,
                    message: "bad".to_string(),
                })
                .collect(),
            rows_read: 12,
        };
        let txt = format_ingest_summary(&ingest);
        assert!(txt.contains("skipped=12"));
        assert!(txt.contains("line 11: bad"));
        assert!(!txt.contains("line 12: bad"));
        assert!(txt.contains("... 2 more"));
    }
}
