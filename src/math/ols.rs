//! Least squares solver for the linear regressor.
//!
//! The design matrix here is the transformed training partition: tens of
//! thousands of rows but under twenty columns after one-hot encoding. We solve
//! with SVD so that rank-deficient designs (e.g. a grade level that never
//! occurs in a fold) still yield the minimum-norm solution instead of failing.

use nalgebra::{DMatrix, DVector};

/// Solve `min ||X b - y||²` using SVD.
///
/// Returns `None` if no finite solution is found at any tolerance.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Prepend a column of ones to `x`.
pub fn with_intercept(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.clone().insert_column(0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn rank_deficient_design_still_solves() {
        // Second and third columns are identical.
        let x = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        let fitted = &x * &beta;
        for (f, t) in fitted.iter().zip(y.iter()) {
            assert!((f - t).abs() < 1e-8);
        }
        assert!((beta[1] - beta[2]).abs() < 1e-8);
    }

    #[test]
    fn intercept_column_is_prepended() {
        let x = DMatrix::from_row_slice(2, 1, &[4.0, 5.0]);
        let xi = with_intercept(&x);
        assert_eq!(xi.ncols(), 2);
        assert_eq!(xi[(0, 0)], 1.0);
        assert_eq!(xi[(1, 1)], 5.0);
    }
}
