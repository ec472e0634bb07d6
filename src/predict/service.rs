//! Single-row inference on a persisted pipeline.

use std::path::Path;

use crate::domain::{Frame, Target};
use crate::error::AppError;
use crate::fit::TrainedPipeline;
use crate::io::load_pipeline;
use crate::predict::{CaratEstimate, CaratInput, PriceEstimate, PriceInput};

/// Serves predictions from one read-only pipeline.
#[derive(Debug, Clone)]
pub struct PredictionService {
    pipeline: TrainedPipeline,
}

impl PredictionService {
    pub fn new(pipeline: TrainedPipeline) -> Self {
        Self { pipeline }
    }

    /// Load the artifact at `path` and check it predicts `expected`.
    pub fn load(path: &Path, expected: Target) -> Result<Self, AppError> {
        let pipeline = load_pipeline(path)?;
        if pipeline.target != expected {
            return Err(AppError::artifact(format!(
                "Pipeline '{}' predicts {}, expected {}.",
                path.display(),
                pipeline.target.display_name(),
                expected.display_name()
            )));
        }
        Ok(Self { pipeline })
    }

    pub fn target(&self) -> Target {
        self.pipeline.target
    }

    pub fn pipeline(&self) -> &TrainedPipeline {
        &self.pipeline
    }

    /// Predict one scalar from a one-row frame.
    pub fn predict(&self, frame: &Frame) -> Result<f64, AppError> {
        if frame.n_rows() != 1 {
            return Err(AppError::invalid_input(format!(
                "Expected exactly one input row, got {}.",
                frame.n_rows()
            )));
        }
        let pred = self.pipeline.predict(frame)?;
        match pred.first() {
            Some(v) if v.is_finite() => Ok(*v),
            _ => Err(AppError::artifact("Pipeline produced a non-finite prediction.")),
        }
    }

    fn require(&self, target: Target) -> Result<(), AppError> {
        if self.target() != target {
            return Err(AppError::artifact(format!(
                "This service predicts {}, not {}.",
                self.target().display_name(),
                target.display_name()
            )));
        }
        Ok(())
    }

    pub fn predict_price(&self, input: &PriceInput) -> Result<PriceEstimate, AppError> {
        self.require(Target::Price)?;
        let raw = self.predict(&input.to_frame()?)?;
        log::debug!("price prediction raw={raw}");
        Ok(PriceEstimate::from_prediction(raw))
    }

    pub fn predict_carat(&self, input: &CaratInput) -> Result<CaratEstimate, AppError> {
        self.require(Target::Carat)?;
        let raw = self.predict(&input.to_frame()?)?;
        log::debug!("carat prediction raw={raw}");
        Ok(CaratEstimate::from_prediction(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_records};
    use crate::domain::{Clarity, Color, Cut};
    use crate::error::ErrorKind;
    use crate::fit::production_params;
    use crate::io::save_pipeline;

    fn service(target: Target) -> PredictionService {
        let records = generate_records(&SampleConfig { rows: 300, seed: 17 }).unwrap();
        let (frame, y) = Frame::from_records(&records, target).unwrap();
        PredictionService::new(
            TrainedPipeline::fit(target, &production_params(), &frame, &y, 42).unwrap(),
        )
    }

    fn price_input() -> PriceInput {
        PriceInput {
            carat: 1.0,
            cut: Cut::Ideal,
            color: Color::G,
            clarity: Clarity::Vs2,
            depth: 61.8,
            table: 57.0,
            x: 6.4,
            y: 6.45,
            z: 3.97,
        }
    }

    #[test]
    fn price_prediction_is_plausible() {
        let estimate = service(Target::Price).predict_price(&price_input()).unwrap();
        assert!(estimate.price > 1000.0 && estimate.price < 15000.0, "{estimate}");
    }

    #[test]
    fn carat_prediction_reports_grams() {
        let input = CaratInput {
            cut: Cut::Premium,
            color: Color::F,
            clarity: Clarity::Si1,
            depth: 62.0,
            table: 58.0,
            price: 4000.0,
            x: 6.4,
            y: 6.45,
            z: 3.97,
        };
        let estimate = service(Target::Carat).predict_carat(&input).unwrap();
        assert!(estimate.carat > 0.3 && estimate.carat < 3.0, "{estimate}");
        assert_eq!(estimate.grams, estimate.carat / 5.0);
    }

    #[test]
    fn wrong_direction_is_rejected() {
        let err = service(Target::Carat).predict_price(&price_input()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Artifact);
    }

    #[test]
    fn unseen_category_is_rejected() {
        let svc = service(Target::Price);
        let frame = price_input().to_frame().unwrap();
        let mut renamed = Frame::new();
        for column in frame.columns() {
            let data = if column.name == "cut" {
                crate::domain::ColumnData::Categorical(vec!["Excellent".to_string()])
            } else {
                column.data.clone()
            };
            renamed.push(column.name.clone(), data).unwrap();
        }
        let err = svc.predict(&renamed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCategory);
    }

    #[test]
    fn load_checks_the_stored_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("price.json");
        save_pipeline(&path, service(Target::Price).pipeline()).unwrap();

        assert!(PredictionService::load(&path, Target::Price).is_ok());
        let err = PredictionService::load(&path, Target::Carat).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Artifact);
        let err = PredictionService::load(&dir.path().join("nope.json"), Target::Price).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
