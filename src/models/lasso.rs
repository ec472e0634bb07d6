//! L1-regularized linear regression by cyclic coordinate descent.
//!
//! Minimizes `(1 / 2n) ||y - Xw - b||² + alpha ||w||₁`. The intercept is
//! never penalized: columns and target are centered first and `b` is
//! recovered from the means.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LassoParams {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LassoParams {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lasso {
    pub params: LassoParams,
    pub intercept: f64,
    pub coef: Vec<f64>,
    /// Sweeps run before convergence (or `max_iter`).
    pub n_iter: usize,
}

fn soft_threshold(rho: f64, lambda: f64) -> f64 {
    if rho > lambda {
        rho - lambda
    } else if rho < -lambda {
        rho + lambda
    } else {
        0.0
    }
}

impl Lasso {
    pub fn fit(params: &LassoParams, x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        let n = x.nrows();
        let p = x.ncols();
        if n == 0 {
            return Err(AppError::training("Lasso needs at least one row."));
        }
        if params.alpha.is_nan() || params.alpha < 0.0 {
            return Err(AppError::training(format!(
                "Lasso alpha must be non-negative (got {}).",
                params.alpha
            )));
        }

        let x_mean: Vec<f64> = (0..p).map(|j| x.column(j).mean()).collect();
        let y_mean = y.iter().sum::<f64>() / n as f64;
        let cols: Vec<Vec<f64>> = (0..p)
            .map(|j| x.column(j).iter().map(|v| v - x_mean[j]).collect())
            .collect();
        let norms: Vec<f64> = cols.iter().map(|c| c.iter().map(|v| v * v).sum()).collect();

        let mut w = vec![0.0; p];
        let mut residual: Vec<f64> = y.iter().map(|v| v - y_mean).collect();
        let lambda = params.alpha * n as f64;

        let mut n_iter = 0;
        for iter in 0..params.max_iter {
            n_iter = iter + 1;
            let mut max_delta: f64 = 0.0;
            let mut max_w: f64 = 0.0;

            for j in 0..p {
                if norms[j] == 0.0 {
                    continue;
                }
                let col = &cols[j];
                let old = w[j];
                let rho: f64 = col.iter().zip(&residual).map(|(a, r)| a * r).sum::<f64>()
                    + norms[j] * old;
                let new = soft_threshold(rho, lambda) / norms[j];
                if new != old {
                    let delta = new - old;
                    for (r, a) in residual.iter_mut().zip(col) {
                        *r -= delta * a;
                    }
                    w[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_w = max_w.max(new.abs());
            }

            // Relative size of the largest coefficient update.
            if max_w == 0.0 || max_delta / max_w < params.tol {
                break;
            }
        }

        if w.iter().any(|v| !v.is_finite()) {
            return Err(AppError::training("Lasso diverged to non-finite coefficients."));
        }

        let intercept = y_mean - w.iter().zip(&x_mean).map(|(a, m)| a * m).sum::<f64>();
        Ok(Self {
            params: *params,
            intercept,
            coef: w,
            n_iter,
        })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|r| {
                self.intercept
                    + x.row(r)
                        .iter()
                        .zip(&self.coef)
                        .map(|(a, b)| a * b)
                        .sum::<f64>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (DMatrix<f64>, Vec<f64>) {
        let n = 50;
        let x = DMatrix::from_fn(n, 3, |i, j| match j {
            0 => i as f64 / 10.0,
            1 => ((i * 17) % 11) as f64 / 5.0,
            _ => ((i * 7) % 13) as f64 / 6.0,
        });
        let y = (0..n).map(|i| 1.0 + 3.0 * x[(i, 0)] - 2.0 * x[(i, 1)]).collect();
        (x, y)
    }

    #[test]
    fn small_alpha_is_close_to_least_squares() {
        let (x, y) = data();
        let params = LassoParams {
            alpha: 1e-6,
            tol: 1e-10,
            ..LassoParams::default()
        };
        let model = Lasso::fit(&params, &x, &y).unwrap();
        assert!((model.coef[0] - 3.0).abs() < 1e-3);
        assert!((model.coef[1] + 2.0).abs() < 1e-3);
        assert!(model.coef[2].abs() < 1e-3);
        assert!((model.intercept - 1.0).abs() < 1e-2);
    }

    #[test]
    fn large_alpha_zeroes_every_coefficient() {
        let (x, y) = data();
        let model = Lasso::fit(
            &LassoParams {
                alpha: 1e6,
                ..LassoParams::default()
            },
            &x,
            &y,
        )
        .unwrap();
        assert!(model.coef.iter().all(|c| *c == 0.0));
        let mean = y.iter().sum::<f64>() / y.len() as f64;
        assert!((model.intercept - mean).abs() < 1e-12);
    }

    #[test]
    fn soft_threshold_shrinks_towards_zero() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }
}
