//! Export search results to CSV.
//!
//! One row per (target, family, partition) so the file pivots easily in a
//! spreadsheet.

use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::fit::SearchResult;

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    target: &'a str,
    family: &'a str,
    best_params: String,
    cv_mean_r2: f64,
    partition: &'a str,
    mae: f64,
    rmse: f64,
    r2: f64,
}

pub fn write_results_csv(path: &Path, results: &[SearchResult]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        AppError::io(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    for result in results {
        let best = result.best();
        for (partition, m) in [("train", &result.train_metrics), ("test", &result.test_metrics)] {
            writer
                .serialize(ResultRow {
                    target: result.target.column(),
                    family: result.family.id(),
                    best_params: best.params.describe(),
                    cv_mean_r2: best.mean_score,
                    partition,
                    mae: m.mae,
                    rmse: m.rmse,
                    r2: m.r2,
                })
                .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;
    log::info!("exported {} search result(s) to {}", results.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelFamily, Target};
    use crate::fit::GridPointScore;
    use crate::math::RegressionMetrics;
    use crate::models::{KnnParams, ModelParams};

    #[test]
    fn writes_one_row_per_partition() {
        let metrics = RegressionMetrics {
            mae: 1.0,
            rmse: 2.0,
            r2: 0.5,
        };
        let result = SearchResult {
            family: ModelFamily::Knn,
            target: Target::Price,
            scores: vec![GridPointScore {
                params: ModelParams::Knn(KnnParams { n_neighbors: 5 }),
                fold_scores: vec![0.4, 0.6],
                mean_score: 0.5,
            }],
            best_index: 0,
            train_metrics: metrics,
            test_metrics: metrics,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        write_results_csv(&path, &[result]).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(
            lines[0],
            "target,family,best_params,cv_mean_r2,partition,mae,rmse,r2"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("price,knn,n_neighbors=5,0.5,train"));
        assert!(lines[2].contains(",test,"));
    }
}
