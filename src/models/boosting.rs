//! Second-order gradient boosting on depth-limited trees.
//!
//! Squared loss gives `g = ŷ - y` and `h = 1`, so every round fits a tree to
//! the residuals with leaves `w = -G / (H + lambda)` and split gain
//! `½ [G_L²/(H_L+λ) + G_R²/(H_R+λ) - G²/(H+λ)] - γ`.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub reg_lambda: f64,
    pub gamma: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            reg_lambda: 1.0,
            gamma: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub params: BoostingParams,
    /// Starting prediction (training mean).
    base_score: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn fit(params: &BoostingParams, x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        let n = x.nrows();
        if n == 0 {
            return Err(AppError::training("Gradient boosting needs at least one row."));
        }
        if params.learning_rate.is_nan() || params.learning_rate <= 0.0 {
            return Err(AppError::training(format!(
                "Learning rate must be positive (got {}).",
                params.learning_rate
            )));
        }

        let tree_params = TreeParams {
            max_depth: Some(params.max_depth),
            lambda: params.reg_lambda,
            gamma: params.gamma,
            ..TreeParams::default()
        };

        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut pred = vec![base_score; n];
        let mut residual = vec![0.0; n];
        let rows: Vec<usize> = (0..n).collect();
        // Trees never subsample features here; the rng is never drawn from.
        let mut rng = StdRng::seed_from_u64(0);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            for i in 0..n {
                residual[i] = y[i] - pred[i];
            }
            let tree = RegressionTree::fit(x, &residual, &rows, &tree_params, &mut rng);
            for (i, p) in pred.iter_mut().enumerate() {
                *p += params.learning_rate * tree.predict_row(x, i);
            }
            trees.push(tree);
        }

        log::debug!(
            "boosting: {} trees, lr={}, final train rmse={:.4}",
            trees.len(),
            params.learning_rate,
            (pred.iter().zip(y).map(|(p, t)| (p - t).powi(2)).sum::<f64>() / n as f64).sqrt()
        );

        Ok(Self {
            params: *params,
            base_score,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|r| {
                self.base_score
                    + self
                        .trees
                        .iter()
                        .map(|t| self.params.learning_rate * t.predict_row(x, r))
                        .sum::<f64>()
            })
            .collect()
    }
}
