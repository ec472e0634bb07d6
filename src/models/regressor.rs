//! Family dispatch.
//!
//! Search code handles models as values of two enums: `ModelParams` (one grid
//! point, not yet fitted) and `Regressor` (a fitted model). Each family's own
//! module owns the numerics.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::ModelFamily;
use crate::error::AppError;
use crate::models::{
    BoostingParams, ForestParams, GradientBoosting, KNeighbors, KnnParams, Lasso, LassoParams,
    LinearParams, LinearRegression, ObliviousBoosting, ObliviousParams, RandomForest,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelParams {
    Linear(LinearParams),
    Lasso(LassoParams),
    Knn(KnnParams),
    RandomForest(ForestParams),
    Xgboost(BoostingParams),
    Catboost(ObliviousParams),
}

impl ModelParams {
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelParams::Linear(_) => ModelFamily::Linear,
            ModelParams::Lasso(_) => ModelFamily::Lasso,
            ModelParams::Knn(_) => ModelFamily::Knn,
            ModelParams::RandomForest(_) => ModelFamily::RandomForest,
            ModelParams::Xgboost(_) => ModelFamily::Xgboost,
            ModelParams::Catboost(_) => ModelFamily::Catboost,
        }
    }

    /// Fit on a transformed design matrix. `seed` drives the randomized
    /// families and is ignored by the rest.
    pub fn fit(&self, x: &DMatrix<f64>, y: &[f64], seed: u64) -> Result<Regressor, AppError> {
        if x.nrows() != y.len() {
            return Err(AppError::training(format!(
                "Design has {} rows but target has {}.",
                x.nrows(),
                y.len()
            )));
        }
        Ok(match self {
            ModelParams::Linear(p) => Regressor::Linear(LinearRegression::fit(p, x, y)?),
            ModelParams::Lasso(p) => Regressor::Lasso(Lasso::fit(p, x, y)?),
            ModelParams::Knn(p) => Regressor::Knn(KNeighbors::fit(p, x, y)?),
            ModelParams::RandomForest(p) => {
                Regressor::RandomForest(RandomForest::fit(p, x, y, seed)?)
            }
            ModelParams::Xgboost(p) => Regressor::Xgboost(GradientBoosting::fit(p, x, y)?),
            ModelParams::Catboost(p) => Regressor::Catboost(ObliviousBoosting::fit(p, x, y)?),
        })
    }

    /// Searched hyperparameters as `name=value` pairs.
    pub fn describe(&self) -> String {
        match self {
            ModelParams::Linear(p) => format!("fit_intercept={}", p.fit_intercept),
            ModelParams::Lasso(p) => format!("alpha={}", p.alpha),
            ModelParams::Knn(p) => format!("n_neighbors={}", p.n_neighbors),
            ModelParams::RandomForest(p) => format!(
                "n_estimators={}, max_depth={}, max_features={}",
                p.n_estimators,
                p.max_depth
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                p.max_features
            ),
            ModelParams::Xgboost(p) => format!(
                "n_estimators={}, learning_rate={}",
                p.n_estimators, p.learning_rate
            ),
            ModelParams::Catboost(p) => format!(
                "depth={}, learning_rate={}, iterations={}",
                p.depth, p.learning_rate, p.iterations
            ),
        }
    }
}

impl std::fmt::Display for ModelParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.family().display_name(), self.describe())
    }
}

/// A fitted model of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "model", rename_all = "snake_case")]
pub enum Regressor {
    Linear(LinearRegression),
    Lasso(Lasso),
    Knn(KNeighbors),
    RandomForest(RandomForest),
    Xgboost(GradientBoosting),
    Catboost(ObliviousBoosting),
}

impl Regressor {
    pub fn family(&self) -> ModelFamily {
        self.params().family()
    }

    pub fn params(&self) -> ModelParams {
        match self {
            Regressor::Linear(m) => ModelParams::Linear(m.params),
            Regressor::Lasso(m) => ModelParams::Lasso(m.params),
            Regressor::Knn(m) => ModelParams::Knn(m.params),
            Regressor::RandomForest(m) => ModelParams::RandomForest(m.params),
            Regressor::Xgboost(m) => ModelParams::Xgboost(m.params),
            Regressor::Catboost(m) => ModelParams::Catboost(m.params),
        }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        match self {
            Regressor::Linear(m) => m.predict(x),
            Regressor::Lasso(m) => m.predict(x),
            Regressor::Knn(m) => m.predict(x),
            Regressor::RandomForest(m) => m.predict(x),
            Regressor::Xgboost(m) => m.predict(x),
            Regressor::Catboost(m) => m.predict(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::r2_score;
    use crate::models::MaxFeatures;

    /// y = 5 + 2 x0 - x1 + 0.5 x2 over a deterministic grid.
    fn synthetic(n: usize) -> (DMatrix<f64>, Vec<f64>) {
        let x = DMatrix::from_fn(n, 3, |i, j| match j {
            0 => (i % 10) as f64 / 3.0,
            1 => ((i * 7) % 9) as f64 / 4.0,
            _ => ((i * 11) % 5) as f64,
        });
        let y = (0..n)
            .map(|i| 5.0 + 2.0 * x[(i, 0)] - x[(i, 1)] + 0.5 * x[(i, 2)])
            .collect();
        (x, y)
    }

    #[test]
    fn every_family_learns_a_simple_relationship() {
        let (x, y) = synthetic(150);
        let grid = [
            ModelParams::Linear(LinearParams::default()),
            ModelParams::Lasso(LassoParams {
                alpha: 0.01,
                ..LassoParams::default()
            }),
            ModelParams::Knn(KnnParams { n_neighbors: 3 }),
            ModelParams::RandomForest(ForestParams {
                n_estimators: 20,
                max_depth: None,
                max_features: MaxFeatures::All,
            }),
            ModelParams::Xgboost(BoostingParams::default()),
            ModelParams::Catboost(ObliviousParams {
                depth: 4,
                learning_rate: 0.3,
                iterations: 100,
                ..ObliviousParams::default()
            }),
        ];

        for params in grid {
            let model = params.fit(&x, &y, 42).unwrap();
            assert_eq!(model.family(), params.family());
            let r2 = r2_score(&y, &model.predict(&x));
            assert!(r2 > 0.9, "{params}: r2 = {r2}");
        }
    }

    #[test]
    fn fitted_models_report_their_params() {
        let (x, y) = synthetic(30);
        let params = ModelParams::Knn(KnnParams { n_neighbors: 5 });
        assert_eq!(params.fit(&x, &y, 0).unwrap().params(), params);
        assert_eq!(params.describe(), "n_neighbors=5");
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let (x, _) = synthetic(10);
        let params = ModelParams::Linear(LinearParams::default());
        assert!(params.fit(&x, &[1.0, 2.0], 0).is_err());
    }
}
