//! Ordinary least squares.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::{solve_least_squares, with_intercept};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearParams {
    pub fit_intercept: bool,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            fit_intercept: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub params: LinearParams,
    pub intercept: f64,
    pub coef: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(params: &LinearParams, x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        if x.nrows() == 0 {
            return Err(AppError::training("Linear regression needs at least one row."));
        }
        let target = DVector::from_column_slice(y);
        let design = if params.fit_intercept {
            with_intercept(x)
        } else {
            x.clone()
        };

        let beta = solve_least_squares(&design, &target).ok_or_else(|| {
            AppError::training("Least squares solve failed (ill-conditioned design).")
        })?;

        let (intercept, coef) = if params.fit_intercept {
            (beta[0], beta.iter().skip(1).copied().collect())
        } else {
            (0.0, beta.iter().copied().collect())
        };

        Ok(Self {
            params: *params,
            intercept,
            coef,
        })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        let coef = DVector::from_column_slice(&self.coef);
        (x * coef).iter().map(|v| v + self.intercept).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> (DMatrix<f64>, Vec<f64>) {
        let x = DMatrix::from_fn(10, 2, |i, j| if j == 0 { i as f64 } else { (i * i % 7) as f64 });
        let y = (0..10).map(|i| 4.0 + 2.0 * x[(i, 0)] - 0.5 * x[(i, 1)]).collect();
        (x, y)
    }

    #[test]
    fn recovers_an_exact_plane() {
        let (x, y) = plane();
        let model = LinearRegression::fit(&LinearParams::default(), &x, &y).unwrap();
        assert!((model.intercept - 4.0).abs() < 1e-8);
        assert!((model.coef[0] - 2.0).abs() < 1e-8);
        assert!((model.coef[1] + 0.5).abs() < 1e-8);
    }

    #[test]
    fn without_intercept_the_fit_passes_through_origin() {
        let (x, y) = plane();
        let model = LinearRegression::fit(&LinearParams { fit_intercept: false }, &x, &y).unwrap();
        assert_eq!(model.intercept, 0.0);
        let zero = DMatrix::zeros(1, 2);
        assert_eq!(model.predict(&zero), vec![0.0]);
    }
}
