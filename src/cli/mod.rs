//! Command-line parsing for the gemstone predictor.
//!
//! Argument parsing and command dispatch stay separate from the modeling code;
//! `app` turns these structs into `TrainConfig`/`Paths` values.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Clarity, Color, Cut, ModelFamily, Paths, Target};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gem", version, about = "Gemstone price and carat predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the dataset and write data/train/test CSVs into the artifact directory.
    Ingest(IngestArgs),
    /// Ingest, grid-search every model family, and persist both pipelines.
    Train(TrainArgs),
    /// Predict a price from carat, grades and dimensions.
    PredictPrice(PredictPriceArgs),
    /// Predict a carat weight from a budget, grades and dimensions.
    PredictCarat(PredictCaratArgs),
    /// Print grade breakdowns and a price histogram for the dataset.
    Analyze(AnalyzeArgs),
    /// Write a synthetic dataset CSV.
    Sample(SampleArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

/// File locations shared by every subcommand.
///
/// Environment variables (optionally from `.env`) override the defaults;
/// explicit flags override both.
#[derive(Debug, Args, Clone)]
pub struct PathArgs {
    /// Source dataset CSV.
    #[arg(long, env = "GEM_DATASET", default_value = "data/diamonds.csv")]
    pub dataset: PathBuf,

    /// Directory for the ingested data/train/test CSVs.
    #[arg(long, env = "GEM_ARTIFACT_DIR", default_value = "artifact")]
    pub artifact_dir: PathBuf,

    /// Directory holding the persisted pipelines.
    #[arg(long, env = "GEM_MODEL_DIR", default_value = "data")]
    pub model_dir: PathBuf,

    /// Price pipeline path (default: <model-dir>/final_model_pipeline.json).
    #[arg(long)]
    pub price_model: Option<PathBuf>,

    /// Carat pipeline path (default: <model-dir>/final_model_pipeline_carat.json).
    #[arg(long)]
    pub carat_model: Option<PathBuf>,
}

impl PathArgs {
    pub fn to_paths(&self) -> Paths {
        Paths {
            dataset: self.dataset.clone(),
            artifact_dir: self.artifact_dir.clone(),
            price_model: self
                .price_model
                .clone()
                .unwrap_or_else(|| self.model_dir.join("final_model_pipeline.json")),
            carat_model: self
                .carat_model
                .clone()
                .unwrap_or_else(|| self.model_dir.join("final_model_pipeline_carat.json")),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct SplitArgs {
    /// Seed for the train/test shuffle (and randomized model families).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows held out for testing.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,
}

#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(flatten)]
    pub split: SplitArgs,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    #[command(flatten)]
    pub split: SplitArgs,

    /// Cross-validation folds.
    #[arg(long, default_value_t = 5)]
    pub folds: usize,

    /// Model families to grid-search (comma separated; default: all).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub models: Vec<ModelFamily>,

    /// Train only this direction (default: price then carat).
    #[arg(long, value_enum)]
    pub target: Option<Target>,

    /// Export the search summary to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write a markdown training report into this directory.
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

/// Grades and dimensions common to both prediction directions.
#[derive(Debug, Args, Clone)]
pub struct GemArgs {
    /// Cut grade (Ideal, Premium, Very Good, Good, Fair).
    #[arg(long)]
    pub cut: Cut,

    /// Color grade (D best .. J).
    #[arg(long)]
    pub color: Color,

    /// Clarity grade (IF best .. I1).
    #[arg(long)]
    pub clarity: Clarity,

    /// Depth percentage as entered; the model uses the value derived from x, y, z.
    #[arg(long, default_value_t = 61.8)]
    pub depth: f64,

    /// Table percentage.
    #[arg(long)]
    pub table: f64,

    /// Length in mm.
    #[arg(long)]
    pub x: f64,

    /// Width in mm.
    #[arg(long)]
    pub y: f64,

    /// Height in mm.
    #[arg(long)]
    pub z: f64,
}

#[derive(Debug, Args, Clone)]
pub struct PredictPriceArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Carat weight.
    #[arg(long)]
    pub carat: f64,

    #[command(flatten)]
    pub gem: GemArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PredictCaratArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Budget in dollars.
    #[arg(long)]
    pub price: f64,

    #[command(flatten)]
    pub gem: GemArgs,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Price histogram bins.
    #[arg(long, default_value_t = 12)]
    pub bins: usize,

    /// Bar width (columns).
    #[arg(long, default_value_t = 50)]
    pub width: usize,

    /// Skip the ASCII charts.
    #[arg(long)]
    pub no_plot: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV (default: the dataset path).
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub paths: PathArgs,

    /// Number of rows to generate.
    #[arg(long, default_value_t = 2000)]
    pub rows: usize,

    /// Generator seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}
