//! Synthetic gemstone dataset generation.
//!
//! Produces records that look like the real dataset: log-normal carat weights,
//! grade frequencies skewed toward the better grades, dimensions consistent
//! with weight and depth, and a price that grows super-linearly with carat and
//! drops with every grade step. Used for demos and as a test fixture.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};

use crate::domain::{Clarity, Color, Cut, Grade, Record};
use crate::error::AppError;

const CUT_WEIGHTS: [f64; 5] = [0.40, 0.26, 0.22, 0.09, 0.03];
const COLOR_WEIGHTS: [f64; 7] = [0.13, 0.18, 0.18, 0.21, 0.15, 0.10, 0.05];
const CLARITY_WEIGHTS: [f64; 8] = [0.03, 0.07, 0.09, 0.15, 0.23, 0.24, 0.17, 0.02];

/// Price of a one-carat stone of the best grades.
const BASE_PRICE: f64 = 5200.0;
const CARAT_EXPONENT: f64 = 1.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleConfig {
    pub rows: usize,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 2000,
            seed: 42,
        }
    }
}

fn distribution_error(e: impl std::fmt::Display) -> AppError {
    AppError::invalid_input(format!("Sample distribution error: {e}"))
}

fn pick<G: Grade>(rng: &mut StdRng, weights: &WeightedIndex<f64>) -> G {
    G::ALL[weights.sample(rng)]
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let p = 10f64.powi(decimals);
    (v * p).round() / p
}

/// Generate `config.rows` records. Same config, same records.
pub fn generate_records(config: &SampleConfig) -> Result<Vec<Record>, AppError> {
    if config.rows == 0 {
        return Err(AppError::invalid_input("Sample row count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let carat_dist = LogNormal::new(0.7f64.ln(), 0.5).map_err(distribution_error)?;
    let depth_dist = Normal::<f64>::new(61.75, 1.4).map_err(distribution_error)?;
    let table_dist = Normal::<f64>::new(57.5, 2.2).map_err(distribution_error)?;
    let jitter = Normal::<f64>::new(0.0, 0.01).map_err(distribution_error)?;
    let price_noise = Normal::<f64>::new(0.0, 0.12).map_err(distribution_error)?;

    let cut_w = WeightedIndex::new(CUT_WEIGHTS).map_err(distribution_error)?;
    let color_w = WeightedIndex::new(COLOR_WEIGHTS).map_err(distribution_error)?;
    let clarity_w = WeightedIndex::new(CLARITY_WEIGHTS).map_err(distribution_error)?;

    let mut out = Vec::with_capacity(config.rows);
    for _ in 0..config.rows {
        let carat = round_to(carat_dist.sample(&mut rng).clamp(0.2, 5.01), 2);
        let cut: Cut = pick(&mut rng, &cut_w);
        let color: Color = pick(&mut rng, &color_w);
        let clarity: Clarity = pick(&mut rng, &clarity_w);
        let depth = round_to(depth_dist.sample(&mut rng).clamp(43.0, 79.0), 1);
        let table = round_to(table_dist.sample(&mut rng).clamp(43.0, 95.0), 0);

        // Round brilliant: diameter scales with the cube root of weight.
        let x = round_to(6.45 * carat.cbrt() * (1.0 + jitter.sample(&mut rng)), 2).max(0.1);
        let y = round_to(x * (1.0 + 0.8 * jitter.sample(&mut rng)), 2).max(0.1);
        let z = round_to(depth / 100.0 * (x + y) / 2.0, 2).max(0.1);

        let grade_factor = (1.0 - 0.03 * cut.rank() as f64)
            * (1.0 - 0.06 * color.rank() as f64)
            * (1.0 - 0.07 * clarity.rank() as f64);
        let price = BASE_PRICE
            * carat.powf(CARAT_EXPONENT)
            * grade_factor
            * price_noise.sample(&mut rng).exp();
        let price = price.round().clamp(326.0, 18823.0) as u32;

        out.push(Record {
            carat,
            cut,
            color,
            clarity,
            depth,
            table,
            price,
            x,
            y,
            z,
        });
    }

    log::debug!("generated {} synthetic records (seed {})", out.len(), config.seed);
    Ok(out)
}
