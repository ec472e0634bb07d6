//! Gradient boosting with symmetric (oblivious) trees.
//!
//! Every level of an oblivious tree applies the same `(feature, border)` test
//! to all of its nodes, so a depth-`d` tree is `d` comparisons and a lookup
//! into `2^d` leaves. Features are quantized to at most `border_count` borders
//! once per fit; split search then works on per-leaf bin histograms.

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObliviousParams {
    pub depth: usize,
    pub learning_rate: f64,
    pub iterations: usize,
    pub l2_leaf_reg: f64,
    pub border_count: usize,
}

impl Default for ObliviousParams {
    fn default() -> Self {
        Self {
            depth: 6,
            learning_rate: 0.03,
            iterations: 1000,
            l2_leaf_reg: 3.0,
            border_count: 254,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousTree {
    /// `(feature, border)` per level; a row goes right when `x > border`.
    splits: Vec<(usize, f64)>,
    leaves: Vec<f64>,
}

impl ObliviousTree {
    fn leaf_index(&self, x: &DMatrix<f64>, row: usize) -> usize {
        self.splits.iter().fold(0, |idx, &(feature, border)| {
            idx * 2 + usize::from(x[(row, feature)] > border)
        })
    }

    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        self.leaves[self.leaf_index(x, row)]
    }

    pub fn depth(&self) -> usize {
        self.splits.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousBoosting {
    pub params: ObliviousParams,
    base_score: f64,
    trees: Vec<ObliviousTree>,
}

/// Candidate borders of one feature, ascending.
fn compute_borders(values: &[f64], border_count: usize) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let mut unique = sorted.clone();
    unique.dedup();

    if unique.len() <= border_count + 1 {
        return unique.windows(2).map(|w| w[0] + (w[1] - w[0]) / 2.0).collect();
    }

    let n = sorted.len();
    let max = unique[unique.len() - 1];
    let mut borders: Vec<f64> = (1..=border_count)
        .map(|q| sorted[q * n / (border_count + 1)])
        .filter(|b| *b < max)
        .collect();
    borders.dedup();
    borders
}

/// Quantized view of the training matrix.
struct Quantized {
    borders: Vec<Vec<f64>>,
    /// `bins[f][i]` = number of borders of `f` strictly below `x[i, f]`.
    bins: Vec<Vec<u16>>,
}

impl Quantized {
    fn new(x: &DMatrix<f64>, border_count: usize) -> Self {
        let (borders, bins) = (0..x.ncols())
            .into_par_iter()
            .map(|f| {
                let column: Vec<f64> = x.column(f).iter().copied().collect();
                let borders = compute_borders(&column, border_count);
                let bins = column
                    .iter()
                    .map(|v| borders.partition_point(|b| b < v) as u16)
                    .collect();
                (borders, bins)
            })
            .unzip();
        Self { borders, bins }
    }
}

/// Best border of one feature given the current leaf assignment:
/// `(score, border index)`.
fn best_border(
    bins: &[u16],
    n_borders: usize,
    leaf: &[usize],
    n_leaves: usize,
    residual: &[f64],
    lambda: f64,
) -> Option<(f64, usize)> {
    if n_borders == 0 {
        return None;
    }
    let n_bins = n_borders + 1;
    let mut sums = vec![0.0; n_leaves * n_bins];
    let mut counts = vec![0usize; n_leaves * n_bins];
    for i in 0..residual.len() {
        let cell = leaf[i] * n_bins + bins[i] as usize;
        sums[cell] += residual[i];
        counts[cell] += 1;
    }

    let totals: Vec<(f64, usize)> = (0..n_leaves)
        .map(|l| {
            let cells = l * n_bins..(l + 1) * n_bins;
            (sums[cells.clone()].iter().sum(), counts[cells].iter().sum())
        })
        .collect();

    let score = |s: f64, c: usize| s * s / (c as f64 + lambda);
    let mut left_sum = vec![0.0; n_leaves];
    let mut left_count = vec![0usize; n_leaves];
    let mut best: Option<(f64, usize)> = None;

    for k in 0..n_borders {
        let mut total_score = 0.0;
        for l in 0..n_leaves {
            left_sum[l] += sums[l * n_bins + k];
            left_count[l] += counts[l * n_bins + k];
            let (s, c) = totals[l];
            total_score += score(left_sum[l], left_count[l]) + score(s - left_sum[l], c - left_count[l]);
        }
        if best.is_none_or(|(b, _)| total_score > b) {
            best = Some((total_score, k));
        }
    }
    best
}

fn fit_tree(q: &Quantized, residual: &[f64], params: &ObliviousParams) -> ObliviousTree {
    let n = residual.len();
    let mut leaf = vec![0usize; n];
    let mut splits = Vec::with_capacity(params.depth);

    for level in 0..params.depth {
        let n_leaves = 1 << level;
        let per_feature: Vec<Option<(f64, usize)>> = (0..q.bins.len())
            .into_par_iter()
            .map(|f| {
                best_border(
                    &q.bins[f],
                    q.borders[f].len(),
                    &leaf,
                    n_leaves,
                    residual,
                    params.l2_leaf_reg,
                )
            })
            .collect();

        let mut best: Option<(f64, usize, usize)> = None;
        for (f, cand) in per_feature.into_iter().enumerate() {
            if let Some((score, k)) = cand {
                if best.is_none_or(|(b, _, _)| score > b) {
                    best = Some((score, f, k));
                }
            }
        }
        let Some((_, feature, k)) = best else {
            break;
        };

        let bins = &q.bins[feature];
        for i in 0..n {
            leaf[i] = leaf[i] * 2 + usize::from(bins[i] as usize > k);
        }
        splits.push((feature, q.borders[feature][k]));
    }

    let n_leaves = 1 << splits.len();
    let mut sums = vec![0.0; n_leaves];
    let mut counts = vec![0usize; n_leaves];
    for i in 0..n {
        sums[leaf[i]] += residual[i];
        counts[leaf[i]] += 1;
    }
    let leaves = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| s / (c as f64 + params.l2_leaf_reg))
        .collect();

    ObliviousTree { splits, leaves }
}

impl ObliviousBoosting {
    pub fn fit(params: &ObliviousParams, x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        let n = x.nrows();
        if n == 0 {
            return Err(AppError::training("Oblivious boosting needs at least one row."));
        }
        if params.depth > 16 {
            return Err(AppError::training(format!(
                "Tree depth {} exceeds the supported maximum of 16.",
                params.depth
            )));
        }
        if params.learning_rate.is_nan() || params.learning_rate <= 0.0 {
            return Err(AppError::training(format!(
                "Learning rate must be positive (got {}).",
                params.learning_rate
            )));
        }

        let border_count = params.border_count.clamp(1, u16::MAX as usize - 1);
        let q = Quantized::new(x, border_count);

        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut pred = vec![base_score; n];
        let mut residual = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.iterations);

        for _ in 0..params.iterations {
            for i in 0..n {
                residual[i] = y[i] - pred[i];
            }
            let tree = fit_tree(&q, &residual, params);
            for (i, p) in pred.iter_mut().enumerate() {
                *p += params.learning_rate * tree.predict_row(x, i);
            }
            trees.push(tree);
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::r2_score;

    #[test]
    fn few_unique_values_use_midpoint_borders() {
        assert_eq!(compute_borders(&[0.0, 1.0, 1.0, 0.0], 254), vec![0.5]);
        assert!(compute_borders(&[3.0, 3.0], 254).is_empty());
    }

    #[test]
    fn many_unique_values_are_capped() {
        let values: Vec<f64> = (0..1000).map(f64::from).collect();
        let borders = compute_borders(&values, 16);
        assert!(borders.len() <= 16);
        assert!(borders.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn trees_are_symmetric_and_full_depth() {
        let x = DMatrix::from_fn(64, 2, |i, j| if j == 0 { (i % 8) as f64 } else { (i / 8) as f64 });
        let y: Vec<f64> = (0..64).map(|i| x[(i, 0)] + 2.0 * x[(i, 1)]).collect();
        let params = ObliviousParams {
            depth: 3,
            learning_rate: 0.5,
            iterations: 60,
            ..ObliviousParams::default()
        };
        let model = ObliviousBoosting::fit(&params, &x, &y).unwrap();
        assert_eq!(model.n_trees(), 60);
        assert!(model.trees.iter().all(|t| t.depth() == 3 && t.leaves.len() == 8));
        assert!(r2_score(&y, &model.predict(&x)) > 0.98);
    }

    #[test]
    fn constant_features_yield_stumps_at_the_mean() {
        let x = DMatrix::from_element(5, 2, 1.0);
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let params = ObliviousParams {
            iterations: 3,
            ..ObliviousParams::default()
        };
        let model = ObliviousBoosting::fit(&params, &x, &y).unwrap();
        assert!(model.trees.iter().all(|t| t.depth() == 0));
        assert!(model.predict(&x).iter().all(|p| (p - 3.0).abs() < 1e-12));
    }
}
