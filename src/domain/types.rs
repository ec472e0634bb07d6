//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - parsed from the dataset CSV and written back out by ingestion
//! - carried inside persisted pipelines (targets, model families)
//! - selected from the command line

use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// An ordered quality scale.
///
/// `ALL` lists the levels best → worst. The one-hot encoder orders its
/// vocabulary by this ranking, so it must never change between training and
/// inference.
pub trait Grade: Copy + Eq + std::fmt::Debug + 'static {
    /// Column name in the dataset.
    const COLUMN: &'static str;
    /// Every level, best first.
    const ALL: &'static [Self];

    /// Label as it appears in the dataset.
    fn label(self) -> &'static str;

    /// Position in `ALL` (0 = best).
    fn rank(self) -> usize {
        Self::ALL.iter().position(|g| *g == self).unwrap_or(usize::MAX)
    }

    /// Parse a dataset label, accepting case and separator variations
    /// (`Very Good`, `very-good`, `VERY_GOOD`).
    fn parse_label(raw: &str) -> Result<Self, AppError> {
        let wanted = normalize_label(raw);
        Self::ALL
            .iter()
            .copied()
            .find(|g| normalize_label(g.label()) == wanted)
            .ok_or_else(|| AppError::unknown_category(Self::COLUMN, raw.trim()))
    }
}

fn normalize_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Cut grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cut {
    Ideal,
    Premium,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
}

impl Grade for Cut {
    const COLUMN: &'static str = "cut";
    const ALL: &'static [Self] = &[Cut::Ideal, Cut::Premium, Cut::VeryGood, Cut::Good, Cut::Fair];

    fn label(self) -> &'static str {
        match self {
            Cut::Ideal => "Ideal",
            Cut::Premium => "Premium",
            Cut::VeryGood => "Very Good",
            Cut::Good => "Good",
            Cut::Fair => "Fair",
        }
    }
}

/// Color grade (D is colorless, J is the most tinted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    D,
    E,
    F,
    G,
    H,
    I,
    J,
}

impl Grade for Color {
    const COLUMN: &'static str = "color";
    const ALL: &'static [Self] = &[
        Color::D,
        Color::E,
        Color::F,
        Color::G,
        Color::H,
        Color::I,
        Color::J,
    ];

    fn label(self) -> &'static str {
        match self {
            Color::D => "D",
            Color::E => "E",
            Color::F => "F",
            Color::G => "G",
            Color::H => "H",
            Color::I => "I",
            Color::J => "J",
        }
    }
}

/// Clarity grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Clarity {
    #[serde(rename = "IF")]
    If,
    #[serde(rename = "VVS1")]
    Vvs1,
    #[serde(rename = "VVS2")]
    Vvs2,
    #[serde(rename = "VS1")]
    Vs1,
    #[serde(rename = "VS2")]
    Vs2,
    #[serde(rename = "SI1")]
    Si1,
    #[serde(rename = "SI2")]
    Si2,
    #[serde(rename = "I1")]
    I1,
}

impl Grade for Clarity {
    const COLUMN: &'static str = "clarity";
    const ALL: &'static [Self] = &[
        Clarity::If,
        Clarity::Vvs1,
        Clarity::Vvs2,
        Clarity::Vs1,
        Clarity::Vs2,
        Clarity::Si1,
        Clarity::Si2,
        Clarity::I1,
    ];

    fn label(self) -> &'static str {
        match self {
            Clarity::If => "IF",
            Clarity::Vvs1 => "VVS1",
            Clarity::Vvs2 => "VVS2",
            Clarity::Vs1 => "VS1",
            Clarity::Vs2 => "VS2",
            Clarity::Si1 => "SI1",
            Clarity::Si2 => "SI2",
            Clarity::I1 => "I1",
        }
    }
}

impl FromStr for Cut {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cut::parse_label(s)
    }
}

impl FromStr for Color {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse_label(s)
    }
}

impl FromStr for Clarity {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Clarity::parse_label(s)
    }
}

/// Categorical columns shared by both prediction directions.
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["cut", "color", "clarity"];

/// Canonical label and rank of a value in a grade column.
///
/// Returns `None` for columns that are not grades and for labels that are not
/// levels of the column's scale.
pub fn grade_level(column: &str, raw: &str) -> Option<(&'static str, usize)> {
    fn level<G: Grade>(raw: &str) -> Option<(&'static str, usize)> {
        G::parse_label(raw).ok().map(|g| (g.label(), g.rank()))
    }

    match column {
        "cut" => level::<Cut>(raw),
        "color" => level::<Color>(raw),
        "clarity" => level::<Clarity>(raw),
        _ => None,
    }
}

/// Dataset header, in file order.
pub const DATASET_COLUMNS: [&str; 10] = [
    "carat", "cut", "color", "clarity", "depth", "table", "price", "x", "y", "z",
];

/// One gemstone observation.
///
/// Field order matches the dataset header so `csv::Writer::serialize` emits
/// the same layout it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub carat: f64,
    pub cut: Cut,
    pub color: Color,
    pub clarity: Clarity,
    pub depth: f64,
    pub table: f64,
    pub price: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Record {
    /// Numeric value of a named column (`None` for categorical or unknown names).
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "carat" => Some(self.carat),
            "depth" => Some(self.depth),
            "table" => Some(self.table),
            "price" => Some(f64::from(self.price)),
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            _ => None,
        }
    }

    /// Label of a named categorical column.
    pub fn categorical(&self, column: &str) -> Option<&'static str> {
        match column {
            "cut" => Some(self.cut.label()),
            "color" => Some(self.color.label()),
            "clarity" => Some(self.clarity.label()),
            _ => None,
        }
    }
}

/// Which quantity a pipeline predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Price,
    Carat,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Price, Target::Carat];

    /// Dataset column holding the target.
    pub fn column(self) -> &'static str {
        match self {
            Target::Price => "price",
            Target::Carat => "carat",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Target::Price => "Price",
            Target::Carat => "Carat",
        }
    }

    /// Input columns in the exact order the pipeline expects.
    pub fn feature_columns(self) -> &'static [&'static str] {
        match self {
            Target::Price => &["carat", "cut", "color", "clarity", "depth", "table", "x", "y", "z"],
            Target::Carat => &["cut", "color", "clarity", "depth", "table", "price", "x", "y", "z"],
        }
    }

    /// Columns standardized by the scaler.
    pub fn numeric_columns(self) -> &'static [&'static str] {
        match self {
            Target::Price => &["carat", "depth", "table", "x", "y", "z"],
            Target::Carat => &["depth", "table", "price", "x", "y", "z"],
        }
    }

    pub fn is_categorical(column: &str) -> bool {
        CATEGORICAL_COLUMNS.contains(&column)
    }
}

/// The six regressor families compared during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Ordinary least squares.
    Linear,
    /// L1-regularized linear regression.
    Lasso,
    /// k-nearest neighbours.
    Knn,
    /// Bagged regression trees.
    RandomForest,
    /// Second-order gradient boosting with depth-limited trees.
    Xgboost,
    /// Gradient boosting with symmetric (oblivious) trees.
    Catboost,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 6] = [
        ModelFamily::Linear,
        ModelFamily::Lasso,
        ModelFamily::Knn,
        ModelFamily::RandomForest,
        ModelFamily::Xgboost,
        ModelFamily::Catboost,
    ];

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelFamily::Linear => "Linear Regression",
            ModelFamily::Lasso => "Lasso",
            ModelFamily::Knn => "K-Neighbors Regressor",
            ModelFamily::RandomForest => "Random Forest Regressor",
            ModelFamily::Xgboost => "XGBRegressor",
            ModelFamily::Catboost => "CatBoost",
        }
    }

    /// Stable identifier used in exports.
    pub fn id(self) -> &'static str {
        match self {
            ModelFamily::Linear => "linear",
            ModelFamily::Lasso => "lasso",
            ModelFamily::Knn => "knn",
            ModelFamily::RandomForest => "random_forest",
            ModelFamily::Xgboost => "xgboost",
            ModelFamily::Catboost => "catboost",
        }
    }
}

/// Filesystem locations used by ingestion, training and serving.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Source dataset CSV.
    pub dataset: PathBuf,
    /// Directory receiving `data.csv`, `train.csv`, `test.csv`.
    pub artifact_dir: PathBuf,
    /// Persisted price pipeline.
    pub price_model: PathBuf,
    /// Persisted carat pipeline.
    pub carat_model: PathBuf,
}

impl Paths {
    pub fn model_path(&self, target: Target) -> &PathBuf {
        match target {
            Target::Price => &self.price_model,
            Target::Carat => &self.carat_model,
        }
    }

    pub fn raw_csv(&self) -> PathBuf {
        self.artifact_dir.join("data.csv")
    }

    pub fn train_csv(&self) -> PathBuf {
        self.artifact_dir.join("train.csv")
    }

    pub fn test_csv(&self) -> PathBuf {
        self.artifact_dir.join("test.csv")
    }
}

/// A full training run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub paths: Paths,
    /// Seed for the train/test split and randomized model families.
    pub seed: u64,
    /// Fraction of rows held out for the test partition.
    pub test_fraction: f64,
    /// Number of cross-validation folds.
    pub folds: usize,
    /// Families to grid-search (empty means all).
    pub families: Vec<ModelFamily>,
    /// Directions to train.
    pub targets: Vec<Target>,
    /// Optional CSV export of the search summary.
    pub export_results: Option<PathBuf>,
    /// Optional directory for a markdown training report.
    pub report_dir: Option<PathBuf>,
}

impl TrainConfig {
    pub fn enabled_families(&self) -> Vec<ModelFamily> {
        if self.families.is_empty() {
            ModelFamily::ALL.to_vec()
        } else {
            ModelFamily::ALL
                .into_iter()
                .filter(|f| self.families.contains(f))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn grade_labels_parse_loosely() {
        assert_eq!("Very Good".parse::<Cut>().unwrap(), Cut::VeryGood);
        assert_eq!("very-good".parse::<Cut>().unwrap(), Cut::VeryGood);
        assert_eq!("vvs1".parse::<Clarity>().unwrap(), Clarity::Vvs1);
        assert_eq!(" e ".parse::<Color>().unwrap(), Color::E);
    }

    #[test]
    fn unknown_grade_is_a_category_error() {
        let err = "Excellent".parse::<Cut>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCategory);
    }

    #[test]
    fn grade_ranks_follow_best_to_worst() {
        assert_eq!(Cut::Ideal.rank(), 0);
        assert_eq!(Cut::Fair.rank(), 4);
        assert_eq!(Color::J.rank(), 6);
        assert_eq!(Clarity::I1.rank(), 7);
        assert_eq!(Clarity::parse_label("SI2").map(Grade::rank).unwrap(), 6);
    }

    #[test]
    fn grade_level_canonicalizes_by_column() {
        assert_eq!(grade_level("cut", "very good"), Some(("Very Good", 2)));
        assert_eq!(grade_level("color", "J"), Some(("J", 6)));
        assert_eq!(grade_level("clarity", "Excellent"), None);
        assert_eq!(grade_level("depth", "61"), None);
    }

    #[test]
    fn feature_schemas_have_nine_columns_without_the_target() {
        for target in Target::ALL {
            let cols = target.feature_columns();
            assert_eq!(cols.len(), 9);
            assert!(!cols.contains(&target.column()));
            for num in target.numeric_columns() {
                assert!(cols.contains(num));
            }
            for cat in CATEGORICAL_COLUMNS {
                assert!(cols.contains(&cat));
            }
        }
    }
}
