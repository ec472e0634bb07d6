//! Brute-force k-nearest-neighbours regression (Euclidean, uniform weights).

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

/// Stores the training partition row-major for contiguous distance scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNeighbors {
    pub params: KnnParams,
    n_features: usize,
    points: Vec<f64>,
    targets: Vec<f64>,
}

impl KNeighbors {
    pub fn fit(params: &KnnParams, x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        if params.n_neighbors == 0 {
            return Err(AppError::training("n_neighbors must be at least 1."));
        }
        if x.nrows() < params.n_neighbors {
            return Err(AppError::training(format!(
                "n_neighbors = {} exceeds the {} training rows.",
                params.n_neighbors,
                x.nrows()
            )));
        }

        let n_features = x.ncols();
        let mut points = Vec::with_capacity(x.nrows() * n_features);
        for r in 0..x.nrows() {
            points.extend(x.row(r).iter());
        }

        Ok(Self {
            params: *params,
            n_features,
            points,
            targets: y.to_vec(),
        })
    }

    fn predict_one(&self, query: &[f64]) -> f64 {
        let k = self.params.n_neighbors;
        // (squared distance, training index): the index breaks distance ties.
        let mut dist: Vec<(f64, usize)> = self
            .points
            .chunks_exact(self.n_features.max(1))
            .take(self.targets.len())
            .enumerate()
            .map(|(i, p)| {
                let d = p.iter().zip(query).map(|(a, b)| (a - b) * (a - b)).sum::<f64>();
                (d, i)
            })
            .collect();

        let cmp = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        if k < dist.len() {
            dist.select_nth_unstable_by(k - 1, cmp);
        }
        dist[..k].iter().map(|&(_, i)| self.targets[i]).sum::<f64>() / k as f64
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let query: Vec<f64> = x.row(r).iter().copied().collect();
                self.predict_one(&query)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_the_nearest_targets() {
        let x = DMatrix::from_row_slice(5, 1, &[0.0, 1.0, 2.0, 10.0, 11.0]);
        let y = vec![1.0, 2.0, 3.0, 100.0, 200.0];
        let model = KNeighbors::fit(&KnnParams { n_neighbors: 3 }, &x, &y).unwrap();

        let q = DMatrix::from_row_slice(2, 1, &[0.9, 10.6]);
        let pred = model.predict(&q);
        assert!((pred[0] - 2.0).abs() < 1e-12);
        assert!((pred[1] - (3.0 + 100.0 + 200.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn one_neighbour_reproduces_training_targets() {
        let x = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 1.0, 5.0, 5.0]);
        let y = vec![1.0, 2.0, 3.0];
        let model = KNeighbors::fit(&KnnParams { n_neighbors: 1 }, &x, &y).unwrap();
        assert_eq!(model.predict(&x), y);
    }

    #[test]
    fn too_few_rows_is_a_training_error() {
        let x = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        assert!(KNeighbors::fit(&KnnParams { n_neighbors: 3 }, &x, &[0.0, 1.0]).is_err());
    }
}
