//! Column transformer: one-hot block followed by the standardized block.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{CATEGORICAL_COLUMNS, Frame, Target};
use crate::error::AppError;
use crate::preprocess::{OneHotEncoder, StandardScaler};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    encoder: OneHotEncoder,
    scaler: StandardScaler,
}

impl ColumnTransformer {
    /// Fit both blocks on the given partition.
    pub fn fit(frame: &Frame, target: Target) -> Result<Self, AppError> {
        Ok(Self {
            encoder: OneHotEncoder::fit(frame, &CATEGORICAL_COLUMNS)?,
            scaler: StandardScaler::fit(frame, target.numeric_columns())?,
        })
    }

    pub fn width(&self) -> usize {
        self.encoder.width() + self.scaler.width()
    }

    /// Output column names, one per matrix column.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.encoder.feature_names();
        names.extend(self.scaler.columns().iter().map(|c| c.name.clone()));
        names
    }

    pub fn transform(&self, frame: &Frame) -> Result<DMatrix<f64>, AppError> {
        let onehot = self.encoder.transform(frame)?;
        let scaled = self.scaler.transform(frame)?;

        let mut out = DMatrix::zeros(frame.n_rows(), self.width());
        out.columns_mut(0, onehot.ncols()).copy_from(&onehot);
        out.columns_mut(onehot.ncols(), scaled.ncols())
            .copy_from(&scaled);
        Ok(out)
    }
}
