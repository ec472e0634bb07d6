//! Grid search with k-fold cross-validation.
//!
//! For every grid point and fold we fit a fresh pipeline (transformer
//! included) on the fold's training rows and score R² on its held-out rows.
//! All `(grid point, fold)` jobs run in parallel; selection afterwards is
//! sequential so the winner never depends on scheduling.

use rayon::prelude::*;

use crate::domain::{Frame, ModelFamily, Target};
use crate::error::AppError;
use crate::fit::cv::{Fold, kfold};
use crate::fit::grid::CatalogEntry;
use crate::fit::pipeline::TrainedPipeline;
use crate::math::{RegressionMetrics, evaluate, r2_score};
use crate::models::ModelParams;

/// Cross-validation outcome of one grid point.
#[derive(Debug, Clone)]
pub struct GridPointScore {
    pub params: ModelParams,
    /// R² per fold; `NaN` where the fit failed.
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// A labelled partition: input frame plus target values.
#[derive(Debug, Clone)]
pub struct Partition {
    pub frame: Frame,
    pub y: Vec<f64>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    fn select(&self, rows: &[usize]) -> Partition {
        Partition {
            frame: self.frame.select_rows(rows),
            y: rows.iter().map(|&i| self.y[i]).collect(),
        }
    }
}

/// Result of searching one family.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub family: ModelFamily,
    pub target: Target,
    pub scores: Vec<GridPointScore>,
    /// Index into `scores` of the winning grid point.
    pub best_index: usize,
    /// Winner refitted on the full training partition.
    pub train_metrics: RegressionMetrics,
    pub test_metrics: RegressionMetrics,
}

impl SearchResult {
    pub fn best(&self) -> &GridPointScore {
        &self.scores[self.best_index]
    }
}

fn score_fold(
    target: Target,
    params: &ModelParams,
    data: &Partition,
    fold: &Fold,
    seed: u64,
) -> Result<f64, AppError> {
    let train = data.select(&fold.train);
    let test = data.select(&fold.test);
    let pipeline = TrainedPipeline::fit(target, params, &train.frame, &train.y, seed)?;
    let pred = pipeline.predict(&test.frame)?;
    Ok(r2_score(&test.y, &pred))
}

/// Highest mean score wins; the earliest grid point wins ties. `NaN` scores
/// never win.
pub fn select_best(scores: &[GridPointScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, s) in scores.iter().enumerate() {
        if s.mean_score.is_nan() {
            continue;
        }
        if best.is_none_or(|b| s.mean_score > scores[b].mean_score) {
            best = Some(i);
        }
    }
    best
}

/// Cross-validate every grid point and return their scores in grid order.
pub fn cross_validate_grid(
    target: Target,
    grid: &[ModelParams],
    data: &Partition,
    folds: usize,
    seed: u64,
) -> Result<Vec<GridPointScore>, AppError> {
    if grid.is_empty() {
        return Err(AppError::training("Hyperparameter grid is empty."));
    }
    let folds = kfold(data.len(), folds)?;

    let jobs: Vec<(usize, usize)> = (0..grid.len())
        .flat_map(|g| (0..folds.len()).map(move |f| (g, f)))
        .collect();

    let results: Vec<f64> = jobs
        .par_iter()
        .map(|&(g, f)| match score_fold(target, &grid[g], data, &folds[f], seed) {
            Ok(score) => {
                log::debug!("{} fold {}: r2={score:.4}", grid[g], f + 1);
                score
            }
            Err(err) => {
                log::warn!("{} fold {} failed: {err}", grid[g], f + 1);
                f64::NAN
            }
        })
        .collect();

    Ok(grid
        .iter()
        .enumerate()
        .map(|(g, params)| {
            let fold_scores = results[g * folds.len()..(g + 1) * folds.len()].to_vec();
            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            GridPointScore {
                params: *params,
                fold_scores,
                mean_score,
            }
        })
        .collect())
}

/// Search one catalog entry: cross-validate the grid, refit the winner on
/// the whole training partition, and evaluate it on both partitions.
pub fn search_family(
    entry: &CatalogEntry,
    target: Target,
    train: &Partition,
    test: &Partition,
    folds: usize,
    seed: u64,
) -> Result<SearchResult, AppError> {
    log::info!(
        "searching {} for {} ({} grid points x {folds} folds)",
        entry.family.display_name(),
        target.display_name(),
        entry.grid.len()
    );

    let scores = cross_validate_grid(target, &entry.grid, train, folds, seed)?;
    let best_index = select_best(&scores).ok_or_else(|| {
        AppError::training(format!(
            "Every {} grid point failed to fit.",
            entry.family.display_name()
        ))
    })?;
    let best = &scores[best_index];
    log::info!(
        "{} best: {} (mean r2={:.4})",
        entry.family.display_name(),
        best.params.describe(),
        best.mean_score
    );

    let pipeline = TrainedPipeline::fit(target, &best.params, &train.frame, &train.y, seed)?;
    let train_metrics = evaluate(&train.y, &pipeline.predict(&train.frame)?);
    let test_metrics = evaluate(&test.y, &pipeline.predict(&test.frame)?);

    Ok(SearchResult {
        family: entry.family,
        target,
        scores,
        best_index,
        train_metrics,
        test_metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_records};
    use crate::fit::grid::family_grid;
    use crate::models::{KnnParams, LinearParams};

    fn partition(rows: usize, seed: u64) -> Partition {
        let records = generate_records(&SampleConfig { rows, seed }).unwrap();
        let (frame, y) = Frame::from_records(&records, Target::Price).unwrap();
        Partition { frame, y }
    }

    fn score(mean: f64) -> GridPointScore {
        GridPointScore {
            params: ModelParams::Linear(LinearParams::default()),
            fold_scores: vec![mean],
            mean_score: mean,
        }
    }

    #[test]
    fn selection_prefers_the_highest_mean_then_the_first() {
        assert_eq!(select_best(&[score(0.5), score(0.9), score(0.9)]), Some(1));
        assert_eq!(select_best(&[score(f64::NAN), score(0.1)]), Some(1));
        assert_eq!(select_best(&[score(f64::NAN)]), None);
    }

    #[test]
    fn grid_search_prefers_the_better_neighbourhood() {
        // A neighbourhood covering a large share of the fold smooths towards
        // the mean; the small one must win on structured data.
        let data = partition(400, 11);
        let grid = [
            ModelParams::Knn(KnnParams { n_neighbors: 120 }),
            ModelParams::Knn(KnnParams { n_neighbors: 3 }),
        ];
        let scores = cross_validate_grid(Target::Price, &grid, &data, 5, 42).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|s| s.fold_scores.len() == 5));
        assert_eq!(select_best(&scores), Some(1));
    }

    #[test]
    fn failed_fits_score_nan_but_do_not_abort() {
        // 400 rows -> 320 per training fold: 500 neighbours cannot fit.
        let data = partition(400, 2);
        let grid = [
            ModelParams::Knn(KnnParams { n_neighbors: 500 }),
            ModelParams::Knn(KnnParams { n_neighbors: 5 }),
        ];
        let scores = cross_validate_grid(Target::Price, &grid, &data, 5, 0).unwrap();
        assert!(scores[0].mean_score.is_nan());
        assert_eq!(select_best(&scores), Some(1));
    }

    #[test]
    fn search_family_reports_metrics_for_both_partitions() {
        let train = partition(500, 4);
        let test = partition(100, 5);
        let entry = CatalogEntry {
            family: ModelFamily::Linear,
            grid: family_grid(ModelFamily::Linear),
        };
        let result = search_family(&entry, Target::Price, &train, &test, 5, 42).unwrap();
        assert_eq!(result.scores.len(), 2);
        // The intercept-free fit cannot beat the one with an intercept here.
        assert_eq!(result.best_index, 0);
        assert!(result.train_metrics.r2 > 0.7);
        assert!(result.test_metrics.rmse > 0.0);
    }
}
