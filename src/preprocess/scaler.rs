//! Standardization of numeric columns.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::Frame;
use crate::error::AppError;

/// Frozen mean and scale of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledColumn {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation, or 1 for a constant column.
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<ScaledColumn>,
}

impl StandardScaler {
    pub fn fit(frame: &Frame, columns: &[&str]) -> Result<Self, AppError> {
        let n = frame.n_rows();
        if n == 0 {
            return Err(AppError::data("Cannot fit a scaler on zero rows."));
        }

        let mut out = Vec::with_capacity(columns.len());
        for &name in columns {
            let values = frame.numeric(name)?;
            let mean = values.iter().sum::<f64>() / n as f64;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            let std = var.sqrt();
            let scale = if std > 0.0 && std.is_finite() { std } else { 1.0 };
            out.push(ScaledColumn {
                name: name.to_string(),
                mean,
                scale,
            });
        }
        Ok(Self { columns: out })
    }

    pub fn columns(&self) -> &[ScaledColumn] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn transform(&self, frame: &Frame) -> Result<DMatrix<f64>, AppError> {
        let mut out = DMatrix::zeros(frame.n_rows(), self.width());
        for (j, col) in self.columns.iter().enumerate() {
            let values = frame.numeric(&col.name)?;
            for (i, v) in values.iter().enumerate() {
                if !v.is_finite() {
                    return Err(AppError::invalid_input(format!(
                        "Non-finite value in column `{}` (row {}).",
                        col.name,
                        i + 1
                    )));
                }
                out[(i, j)] = (v - col.mean) / col.scale;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_with_population_std() {
        let frame = Frame::new()
            .with_numeric("a", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let s = StandardScaler::fit(&frame, &["a"]).unwrap();
        assert!((s.columns()[0].mean - 2.5).abs() < 1e-12);
        assert!((s.columns()[0].scale - 1.25_f64.sqrt()).abs() < 1e-12);

        let m = s.transform(&frame).unwrap();
        let mean: f64 = m.column(0).iter().sum::<f64>() / 4.0;
        let var: f64 = m.column(0).iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_uses_unit_scale() {
        let frame = Frame::new().with_numeric("a", vec![5.0, 5.0]).unwrap();
        let s = StandardScaler::fit(&frame, &["a"]).unwrap();
        assert_eq!(s.columns()[0].scale, 1.0);
        let m = s.transform(&frame).unwrap();
        assert_eq!(m[(0, 0)], 0.0);
    }

    #[test]
    fn statistics_stay_frozen_after_fit() {
        let train = Frame::new().with_numeric("a", vec![0.0, 2.0]).unwrap();
        let other = Frame::new().with_numeric("a", vec![100.0]).unwrap();
        let s = StandardScaler::fit(&train, &["a"]).unwrap();
        let m = s.transform(&other).unwrap();
        assert!((m[(0, 0)] - 99.0).abs() < 1e-12);
    }
}
