//! Markdown training report: run settings, every grid point's fold scores,
//! and the persisted production models.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::TrainingReport;
use crate::domain::TrainConfig;
use crate::error::AppError;
use crate::math::RegressionMetrics;

fn write_err(e: std::io::Error) -> AppError {
    AppError::io(format!("Failed to write training report: {e}"))
}

/// Write `gem_train_<timestamp>_seed<seed>.md` into `dir` and return its path.
pub fn write_training_report(
    dir: &Path,
    report: &TrainingReport,
    config: &TrainConfig,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::io(format!("Failed to create report dir '{}': {e}", dir.display()))
    })?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("gem_train_{ts}_seed{}.md", config.seed));
    let mut file = File::create(&path).map_err(|e| {
        AppError::io(format!("Failed to create report file '{}': {e}", path.display()))
    })?;

    write_report(&mut file, report, config).map_err(write_err)?;
    log::info!("training report written to {}", path.display());
    Ok(path)
}

fn write_report(out: &mut impl Write, report: &TrainingReport, config: &TrainConfig) -> std::io::Result<()> {
    let ingest = &report.ingestion.ingest;
    writeln!(out, "# gem training report")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- dataset: {}", ingest.source.display())?;
    writeln!(
        out,
        "- rows: read={} used={} skipped={}",
        ingest.rows_read,
        ingest.rows_used(),
        ingest.row_errors.len()
    )?;
    writeln!(
        out,
        "- split: train={} test={} (test_fraction={}, seed={})",
        report.ingestion.train.len(),
        report.ingestion.test.len(),
        config.test_fraction,
        config.seed
    )?;
    writeln!(out, "- folds: {}", config.folds)?;

    for target in &report.targets {
        writeln!(out, "\n## Target: {}", target.target.display_name())?;

        for search in &target.searches {
            writeln!(out, "\n### {}", search.family.display_name())?;
            writeln!(out, "| params | mean R2 | fold R2 |")?;
            writeln!(out, "| - | - | - |")?;
            for (idx, score) in search.scores.iter().enumerate() {
                let marker = if idx == search.best_index { " *" } else { "" };
                writeln!(
                    out,
                    "| {}{marker} | {} | {} |",
                    score.params.describe(),
                    fmt_score(score.mean_score),
                    fmt_scores(&score.fold_scores)
                )?;
            }
            write_metrics_table(out, &search.train_metrics, &search.test_metrics)?;
        }

        let p = &target.production;
        writeln!(out, "\n### Production model")?;
        writeln!(out, "- params: {}", p.params)?;
        writeln!(out, "- artifact: {}", p.path.display())?;
        writeln!(out, "- features ({}): {}", p.features.len(), p.features.join(", "))?;
        write_metrics_table(out, &p.train_metrics, &p.test_metrics)?;
    }
    Ok(())
}

fn write_metrics_table(
    out: &mut impl Write,
    train: &RegressionMetrics,
    test: &RegressionMetrics,
) -> std::io::Result<()> {
    writeln!(out, "\n| partition | MAE | RMSE | R2 |")?;
    writeln!(out, "| - | - | - | - |")?;
    for (name, m) in [("train", train), ("test", test)] {
        writeln!(out, "| {name} | {:.4} | {:.4} | {:.4} |", m.mae, m.rmse, m.r2)?;
    }
    Ok(())
}

fn fmt_score(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.4}")
    } else {
        "failed".to_string()
    }
}

fn fmt_scores(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|&v| fmt_score(v)).collect();
    format!("[{}]", parts.join(", "))
}
