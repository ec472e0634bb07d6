//! Regression metrics.

use serde::{Deserialize, Serialize};

/// MAE, RMSE and R² of one prediction set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

/// Coefficient of determination.
///
/// A constant target has no variance to explain: R² is 1 for a perfect fit and
/// 0 otherwise.
pub fn r2_score(y: &[f64], y_hat: &[f64]) -> f64 {
    let n = y.len();
    if n == 0 {
        return 0.0;
    }
    let mean = y.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = y.iter().zip(y_hat).map(|(a, b)| (a - b).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn evaluate(y: &[f64], y_hat: &[f64]) -> RegressionMetrics {
    let n = y.len().min(y_hat.len());
    if n == 0 {
        return RegressionMetrics {
            mae: 0.0,
            rmse: 0.0,
            r2: 0.0,
        };
    }

    let mut abs = 0.0;
    let mut sq = 0.0;
    for (a, b) in y.iter().zip(y_hat) {
        let e = a - b;
        abs += e.abs();
        sq += e * e;
    }

    RegressionMetrics {
        mae: abs / n as f64,
        rmse: (sq / n as f64).sqrt(),
        r2: r2_score(&y[..n], &y_hat[..n]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_match_hand_computation() {
        let y = [3.0, -0.5, 2.0, 7.0];
        let y_hat = [2.5, 0.0, 2.0, 8.0];
        let m = evaluate(&y, &y_hat);

        assert!((m.mae - 0.5).abs() < 1e-6);
        assert!((m.rmse - 0.375_f64.sqrt()).abs() < 1e-6);
        // SS_res = 1.5, SS_tot = 29.1875
        assert!((m.r2 - (1.0 - 1.5 / 29.1875)).abs() < 1e-6);
    }

    #[test]
    fn constant_target_r2_edge_cases() {
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 3.0]), 0.0);
    }

    #[test]
    fn pipeline_training_metrics_match_inline_formulas() {
        use crate::data::sample::{SampleConfig, generate_records};
        use crate::domain::{Frame, Target};
        use crate::fit::TrainedPipeline;
        use crate::models::{LinearParams, ModelParams};

        let records = generate_records(&SampleConfig { rows: 120, seed: 11 }).unwrap();
        let (frame, y) = Frame::from_records(&records, Target::Price).unwrap();
        let params = ModelParams::Linear(LinearParams::default());
        let pipeline = TrainedPipeline::fit(Target::Price, &params, &frame, &y, 0).unwrap();
        let pred = pipeline.predict(&frame).unwrap();
        let m = evaluate(&y, &pred);

        let n = y.len() as f64;
        let mae = y.iter().zip(&pred).map(|(a, b)| (a - b).abs()).sum::<f64>() / n;
        let sse = y.iter().zip(&pred).map(|(a, b)| (a - b) * (a - b)).sum::<f64>();
        let mean = y.iter().sum::<f64>() / n;
        let sst = y.iter().map(|a| (a - mean) * (a - mean)).sum::<f64>();

        assert!((m.mae - mae).abs() < 1e-6);
        assert!((m.rmse - (sse / n).sqrt()).abs() < 1e-6);
        assert!((m.r2 - (1.0 - sse / sst)).abs() < 1e-6);
        assert!(m.r2 > 0.5);
    }

    #[test]
    fn predicting_the_mean_scores_zero() {
        let y = [1.0, 2.0, 3.0];
        assert!(r2_score(&y, &[2.0, 2.0, 2.0]).abs() < 1e-12);
    }
}
