//! Column transformer + regressor, fitted together.
//!
//! A `TrainedPipeline` is also the persisted artifact: it records the target
//! it predicts and the ordered input schema it was fitted on.

use serde::{Deserialize, Serialize};

use crate::domain::{ColumnData, Frame, Target};
use crate::error::AppError;
use crate::models::{ModelParams, Regressor};
use crate::preprocess::ColumnTransformer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    pub target: Target,
    /// Input columns in fit order.
    pub schema: Vec<String>,
    pub transformer: ColumnTransformer,
    pub model: Regressor,
}

impl TrainedPipeline {
    /// Fit a fresh transformer on `frame`, then the regressor on its output.
    pub fn fit(
        target: Target,
        params: &ModelParams,
        frame: &Frame,
        y: &[f64],
        seed: u64,
    ) -> Result<Self, AppError> {
        if frame.n_rows() != y.len() {
            return Err(AppError::training(format!(
                "Frame has {} rows but target has {}.",
                frame.n_rows(),
                y.len()
            )));
        }
        let transformer = ColumnTransformer::fit(frame, target)?;
        let x = transformer.transform(frame)?;
        let model = params.fit(&x, y, seed)?;

        Ok(Self {
            target,
            schema: target
                .feature_columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            transformer,
            model,
        })
    }

    /// Check that `frame` carries every schema column with the right kind.
    pub fn validate(&self, frame: &Frame) -> Result<(), AppError> {
        for name in &self.schema {
            let Some(column) = frame.column(name) else {
                return Err(AppError::schema(format!(
                    "Input is missing column `{name}`."
                )));
            };
            let categorical = Target::is_categorical(name);
            match (&column.data, categorical) {
                (ColumnData::Categorical(_), true) | (ColumnData::Numeric(_), false) => {}
                (_, true) => {
                    return Err(AppError::schema(format!(
                        "Column `{name}` must be categorical."
                    )));
                }
                (_, false) => {
                    return Err(AppError::schema(format!("Column `{name}` must be numeric.")));
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, frame: &Frame) -> Result<Vec<f64>, AppError> {
        self.validate(frame)?;
        let x = self.transformer.transform(frame)?;
        Ok(self.model.predict(&x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_records};
    use crate::error::ErrorKind;
    use crate::math::r2_score;
    use crate::models::LinearParams;

    #[test]
    fn linear_pipeline_explains_most_price_variance() {
        let records = generate_records(&SampleConfig {
            rows: 400,
            seed: 3,
        })
        .unwrap();
        let (frame, y) = Frame::from_records(&records, Target::Price).unwrap();
        let params = ModelParams::Linear(LinearParams::default());
        let pipeline = TrainedPipeline::fit(Target::Price, &params, &frame, &y, 0).unwrap();

        assert_eq!(pipeline.schema, Target::Price.feature_columns());
        let pred = pipeline.predict(&frame).unwrap();
        assert!(r2_score(&y, &pred) > 0.75);
    }

    #[test]
    fn validate_rejects_a_mistyped_column() {
        let records = generate_records(&SampleConfig { rows: 50, seed: 1 }).unwrap();
        let (frame, y) = Frame::from_records(&records, Target::Carat).unwrap();
        let params = ModelParams::Linear(LinearParams::default());
        let pipeline = TrainedPipeline::fit(Target::Carat, &params, &frame, &y, 0).unwrap();

        let mut bad = Frame::new();
        for column in frame.columns() {
            let data = if column.name == "price" {
                ColumnData::Categorical(vec!["x".to_string(); frame.n_rows()])
            } else {
                column.data.clone()
            };
            bad.push(column.name.clone(), data).unwrap();
        }
        let err = pipeline.predict(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
