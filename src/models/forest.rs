//! Random forest regressor: bootstrap-aggregated regression trees.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::tree::{RegressionTree, TreeParams};

/// Features considered at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature (the regressor default).
    All,
    /// A fixed count, clamped to the number of features.
    Count(usize),
}

impl std::fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaxFeatures::All => write!(f, "all"),
            MaxFeatures::Count(k) => write!(f, "{k}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            max_features: MaxFeatures::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Grow `n_estimators` trees in parallel.
    ///
    /// Each tree gets its own seed drawn up front from `seed`, so the forest is
    /// identical regardless of thread scheduling.
    pub fn fit(
        params: &ForestParams,
        x: &DMatrix<f64>,
        y: &[f64],
        seed: u64,
    ) -> Result<Self, AppError> {
        let n = x.nrows();
        if n == 0 || params.n_estimators == 0 {
            return Err(AppError::training(
                "Random forest needs at least one row and one tree.",
            ));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            max_features: match params.max_features {
                MaxFeatures::All => None,
                MaxFeatures::Count(k) => Some(k),
            },
            ..TreeParams::default()
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| rng.r#gen()).collect();

        let trees = seeds
            .into_par_iter()
            .map(|tree_seed| {
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &rows, &tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            params: *params,
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        let k = self.trees.len() as f64;
        (0..x.nrows())
            .into_par_iter()
            .map(|r| self.trees.iter().map(|t| t.predict_row(x, r)).sum::<f64>() / k)
            .collect()
    }
}
