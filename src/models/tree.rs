//! Binary regression trees.
//!
//! One builder serves two families:
//!
//! - the random forest fits raw targets with `lambda = 0`, so leaves hold the
//!   node mean and split gain is the reduction in squared error
//! - gradient boosting fits residuals (negative gradients of squared loss, unit
//!   hessians) with L2-regularized leaves `w = Σr / (n + lambda)`
//!
//! Split search sorts each candidate feature once per node and sweeps prefix
//! sums, so a node of `n` rows costs `O(f · n log n)`.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Nodes at least this large evaluate candidate features in parallel.
const PAR_MIN_ROWS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features sampled per node (`None` = all).
    pub max_features: Option<usize>,
    /// L2 penalty added to the leaf count.
    pub lambda: f64,
    /// Minimum gain required to split.
    pub gamma: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            lambda: 0.0,
            gamma: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted tree stored as a flat arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    x: &'a DMatrix<f64>,
    target: &'a [f64],
    params: &'a TreeParams,
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Fit a tree on `rows` of `x` (duplicates allowed, as in a bootstrap).
    ///
    /// `rng` is only consumed when `max_features` restricts the candidate set.
    pub fn fit(
        x: &DMatrix<f64>,
        target: &[f64],
        rows: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder {
            x,
            target,
            params,
            nodes: Vec::new(),
        };
        let mut rows = rows.to_vec();
        builder.grow(&mut rows, 0, rng);
        RegressionTree {
            nodes: builder.nodes,
        }
    }

    /// Predict one row of `x`.
    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[(row, *feature)] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows()).map(|r| self.predict_row(x, r)).collect()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }
}

impl Builder<'_> {
    fn leaf_value(&self, sum: f64, n: usize) -> f64 {
        let denom = n as f64 + self.params.lambda;
        if denom > 0.0 { sum / denom } else { 0.0 }
    }

    fn grow(&mut self, rows: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let id = self.nodes.len();
        let n = rows.len();
        let sum: f64 = rows.iter().map(|&r| self.target[r]).sum();
        self.nodes.push(TreeNode::Leaf {
            value: self.leaf_value(sum, n),
        });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || n < self.params.min_samples_split.max(2) || self.is_pure(rows) {
            return id;
        }

        let candidates = self.candidate_features(rng);
        let Some(split) = self.best_split(rows, sum, &candidates) else {
            return id;
        };

        // In-place partition: left rows first.
        let mut mid = 0;
        for i in 0..n {
            if self.x[(rows[i], split.feature)] <= split.threshold {
                rows.swap(i, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == n {
            return id;
        }

        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow(left_rows, depth + 1, rng);
        let right = self.grow(right_rows, depth + 1, rng);
        self.nodes[id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn is_pure(&self, rows: &[usize]) -> bool {
        let first = self.target[rows[0]];
        rows.iter().all(|&r| (self.target[r] - first).abs() <= 1e-12)
    }

    fn candidate_features(&self, rng: &mut StdRng) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.params.max_features {
            Some(k) if k < n_features => {
                let mut picked = sample(rng, n_features, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        }
    }

    fn best_split(&self, rows: &[usize], total: f64, candidates: &[usize]) -> Option<Split> {
        let per_feature: Vec<Option<Split>> = if rows.len() >= PAR_MIN_ROWS {
            candidates
                .par_iter()
                .map(|&f| self.best_split_on(rows, total, f))
                .collect()
        } else {
            candidates
                .iter()
                .map(|&f| self.best_split_on(rows, total, f))
                .collect()
        };

        // First feature wins ties so the result does not depend on scheduling.
        let mut best: Option<Split> = None;
        for s in per_feature.into_iter().flatten() {
            if best.is_none_or(|b| s.gain > b.gain) {
                best = Some(s);
            }
        }
        best
    }

    fn best_split_on(&self, rows: &[usize], total: f64, feature: usize) -> Option<Split> {
        let mut pairs: Vec<(f64, f64)> = rows
            .iter()
            .map(|&r| (self.x[(r, feature)], self.target[r]))
            .collect();
        pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let lambda = self.params.lambda;
        let score = |s: f64, c: usize| s * s / (c as f64 + lambda);
        let parent = score(total, n);

        let mut best: Option<Split> = None;
        let mut left_sum = 0.0;
        for i in 0..n - 1 {
            left_sum += pairs[i].1;
            let (lo, hi) = (pairs[i].0, pairs[i + 1].0);
            if hi <= lo {
                continue;
            }
            let n_left = i + 1;
            let gain = 0.5
                * (score(left_sum, n_left) + score(total - left_sum, n - n_left) - parent);
            if gain > self.params.gamma && best.is_none_or(|b| gain > b.gain) {
                let mid = lo + (hi - lo) / 2.0;
                let threshold = if mid < hi { mid } else { lo };
                best = Some(Split {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
        best
    }
}
