//! Shared training workflow used by the CLI and the TUI.
//!
//! ingest -> split -> per target: grid search every family -> fit the
//! production configuration -> persist
//!
//! Front-ends only deal with presentation (printing vs widgets).

use std::path::PathBuf;

use crate::domain::{Frame, Record, Target, TrainConfig};
use crate::error::AppError;
use crate::fit::{Partition, SearchResult, TrainedPipeline, catalog, production_params, search_family};
use crate::io::{IngestionOutput, run_ingestion, save_pipeline};
use crate::math::{RegressionMetrics, evaluate};
use crate::models::ModelParams;

/// The persisted configuration for one target and how it scores.
#[derive(Debug, Clone)]
pub struct ProductionModel {
    pub params: ModelParams,
    pub path: PathBuf,
    /// Encoded feature names the model was fitted on.
    pub features: Vec<String>,
    pub train_metrics: RegressionMetrics,
    pub test_metrics: RegressionMetrics,
}

/// Everything computed for one prediction direction.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Target,
    pub searches: Vec<SearchResult>,
    pub production: ProductionModel,
}

/// All outputs of a `gem train` run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub ingestion: IngestionOutput,
    pub targets: Vec<TargetReport>,
}

impl TrainingReport {
    pub fn searches(&self) -> Vec<SearchResult> {
        self.targets
            .iter()
            .flat_map(|t| t.searches.iter().cloned())
            .collect()
    }
}

fn partition(records: &[Record], target: Target) -> Result<Partition, AppError> {
    let (frame, y) = Frame::from_records(records, target)?;
    Ok(Partition { frame, y })
}

/// Search every enabled family for `target`, then fit and persist the
/// production configuration on the full training partition.
pub fn train_target(
    target: Target,
    train: &[Record],
    test: &[Record],
    config: &TrainConfig,
) -> Result<TargetReport, AppError> {
    let train = partition(train, target)?;
    let test = partition(test, target)?;

    let mut searches = Vec::new();
    for entry in catalog(&config.enabled_families()) {
        searches.push(search_family(
            &entry,
            target,
            &train,
            &test,
            config.folds,
            config.seed,
        )?);
    }

    let params = production_params();
    log::info!("fitting production {} pipeline: {params}", target.display_name());
    let pipeline = TrainedPipeline::fit(target, &params, &train.frame, &train.y, config.seed)?;
    let train_metrics = evaluate(&train.y, &pipeline.predict(&train.frame)?);
    let test_metrics = evaluate(&test.y, &pipeline.predict(&test.frame)?);

    let path = config.paths.model_path(target).clone();
    save_pipeline(&path, &pipeline)?;

    Ok(TargetReport {
        target,
        searches,
        production: ProductionModel {
            params,
            path,
            features: pipeline.transformer.feature_names(),
            train_metrics,
            test_metrics,
        },
    })
}

/// Execute ingestion and then training for every configured target.
pub fn run_training(config: &TrainConfig) -> Result<TrainingReport, AppError> {
    let ingestion = run_ingestion(&config.paths, config.test_fraction, config.seed)?;

    let mut targets = Vec::new();
    for &target in &config.targets {
        targets.push(train_target(
            target,
            &ingestion.train,
            &ingestion.test,
            config,
        )?);
    }

    Ok(TrainingReport { ingestion, targets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_records};
    use crate::domain::{ModelFamily, Paths};
    use crate::io::{load_pipeline, write_records};

    #[test]
    fn training_run_persists_both_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            dataset: dir.path().join("diamonds.csv"),
            artifact_dir: dir.path().join("artifact"),
            price_model: dir.path().join("data").join("price.json"),
            carat_model: dir.path().join("data").join("carat.json"),
        };
        let records = generate_records(&SampleConfig { rows: 1000, seed: 12 }).unwrap();
        write_records(&paths.dataset, &records).unwrap();

        let config = TrainConfig {
            paths: paths.clone(),
            seed: 42,
            test_fraction: 0.2,
            folds: 3,
            families: vec![ModelFamily::Linear, ModelFamily::Lasso],
            targets: Target::ALL.to_vec(),
            export_results: None,
            report_dir: None,
        };
        let report = run_training(&config).unwrap();

        assert_eq!(report.ingestion.test.len(), 200);
        assert_eq!(report.targets.len(), 2);
        assert_eq!(report.searches().len(), 4);
        for t in &report.targets {
            assert_eq!(t.production.params, production_params());
            let loaded = load_pipeline(&t.production.path).unwrap();
            assert_eq!(loaded.target, t.target);
        }
        assert!(paths.train_csv().exists() && paths.test_csv().exists());
    }
}
