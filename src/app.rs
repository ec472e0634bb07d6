//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs ingestion, training, prediction or analysis
//! - prints reports and charts
//! - writes optional exports

use clap::Parser;

use crate::cli::{
    AnalyzeArgs, Command, IngestArgs, PredictCaratArgs, PredictPriceArgs, SampleArgs, TrainArgs,
    TuiArgs,
};
use crate::data::{SampleConfig, generate_records};
use crate::domain::{Target, TrainConfig};
use crate::error::AppError;
use crate::predict::{CaratInput, PredictionService, PriceInput};
use crate::tui::form::{validate_carat_input, validate_price_input};

pub mod pipeline;

/// Entry point for the `gem` binary.
pub fn run() -> Result<(), AppError> {
    // `gem` and `gem --dataset x.csv` behave like `gem tui ...`. Clap requires
    // a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Ingest(args) => handle_ingest(args),
        Command::Train(args) => handle_train(args),
        Command::PredictPrice(args) => handle_predict_price(args),
        Command::PredictCarat(args) => handle_predict_carat(args),
        Command::Analyze(args) => handle_analyze(args),
        Command::Sample(args) => handle_sample(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_ingest(args: IngestArgs) -> Result<(), AppError> {
    let paths = args.paths.to_paths();
    let output =
        crate::io::run_ingestion(&paths, args.split.test_fraction, args.split.seed)?;
    print!("{}", crate::report::format_ingestion(&output));
    Ok(())
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let config = train_config_from_args(&args)?;
    let report = pipeline::run_training(&config)?;

    println!("{}", crate::report::format_training_summary(&report));

    if let Some(path) = &config.export_results {
        crate::io::write_results_csv(path, &report.searches())?;
        println!("Exported search results: {}", path.display());
    }
    if let Some(dir) = &config.report_dir {
        let path = crate::report::write_training_report(dir, &report, &config)?;
        println!("Wrote training report: {}", path.display());
    }
    Ok(())
}

pub fn train_config_from_args(args: &TrainArgs) -> Result<TrainConfig, AppError> {
    if args.folds < 2 {
        return Err(AppError::invalid_input(format!(
            "--folds must be at least 2 (got {}).",
            args.folds
        )));
    }
    Ok(TrainConfig {
        paths: args.paths.to_paths(),
        seed: args.split.seed,
        test_fraction: args.split.test_fraction,
        folds: args.folds,
        families: args.models.clone(),
        targets: match args.target {
            Some(t) => vec![t],
            None => Target::ALL.to_vec(),
        },
        export_results: args.export.clone(),
        report_dir: args.report_dir.clone(),
    })
}

fn handle_predict_price(args: PredictPriceArgs) -> Result<(), AppError> {
    let g = &args.gem;
    let input = PriceInput {
        carat: args.carat,
        cut: g.cut,
        color: g.color,
        clarity: g.clarity,
        depth: g.depth,
        table: g.table,
        x: g.x,
        y: g.y,
        z: g.z,
    };
    validate_price_input(&input)?;

    let paths = args.paths.to_paths();
    let service = PredictionService::load(paths.model_path(Target::Price), Target::Price)?;
    println!("{}", service.predict_price(&input)?);
    Ok(())
}

fn handle_predict_carat(args: PredictCaratArgs) -> Result<(), AppError> {
    let g = &args.gem;
    let input = CaratInput {
        cut: g.cut,
        color: g.color,
        clarity: g.clarity,
        depth: g.depth,
        table: g.table,
        price: args.price,
        x: g.x,
        y: g.y,
        z: g.z,
    };
    validate_carat_input(&input)?;

    let paths = args.paths.to_paths();
    let service = PredictionService::load(paths.model_path(Target::Carat), Target::Carat)?;
    println!("{}", service.predict_carat(&input)?);
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let ingest = crate::io::load_records(&args.paths.dataset)?;
    let summary = crate::analysis::summarize(&ingest.records, args.bins)?;

    print!("{}", crate::report::format_ingest_summary(&ingest));
    println!("{}", crate::report::format_dataset_summary(&summary));
    if !args.no_plot {
        println!("{}", crate::plot::render_summary_charts(&summary, args.width));
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let out = args.out.clone().unwrap_or_else(|| args.paths.dataset.clone());
    let records = generate_records(&SampleConfig {
        rows: args.rows,
        seed: args.seed,
    })?;
    crate::io::write_records(&out, &records)?;
    log::info!("wrote {} synthetic rows (seed {})", records.len(), args.seed);
    println!("Wrote {} rows to {}", records.len(), out.display());
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let paths = args.paths.to_paths();
    let (records, status) = match crate::io::load_records(&paths.dataset) {
        Ok(data) => {
            let status = format!("Loaded {} rows", data.rows_used());
            (data.records, status)
        }
        Err(err) => {
            log::warn!("dataset unavailable: {err}");
            (Vec::new(), format!("{err} (try `gem sample`)"))
        }
    };
    crate::tui::run(crate::tui::TuiContext {
        paths,
        records,
        status,
    })
}

/// Rewrite argv so `gem` defaults to `gem tui`.
///
/// Rules:
/// - `gem`                     -> `gem tui`
/// - `gem --dataset x.csv ...` -> `gem tui --dataset x.csv ...`
/// - `gem --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["gem"])), argv(&["gem", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["gem", "--dataset", "d.csv"])),
            argv(&["gem", "tui", "--dataset", "d.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["gem", "train"])), argv(&["gem", "train"]));
        assert_eq!(rewrite_args(argv(&["gem", "--help"])), argv(&["gem", "--help"]));
    }

    #[test]
    fn train_config_rejects_single_fold() {
        let cli = crate::cli::Cli::parse_from(["gem", "train", "--folds", "1"]);
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert!(train_config_from_args(&args).is_err());
    }

    #[test]
    fn sample_then_predict_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("d.csv");
        let models = dir.path().join("models");
        let d = dataset.to_str().unwrap();
        let m = models.to_str().unwrap();
        let a = dir.path().join("artifact");
        let a = a.to_str().unwrap();

        let cli = crate::cli::Cli::parse_from(["gem", "sample", "--dataset", d, "--rows", "1000"]);
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        handle_sample(args).unwrap();

        let cli = crate::cli::Cli::parse_from([
            "gem", "train", "--dataset", d, "--artifact-dir", a, "--model-dir", m, "--models",
            "linear", "--folds", "3",
        ]);
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        handle_train(args).unwrap();
        assert!(models.join("final_model_pipeline.json").exists());
        assert!(models.join("final_model_pipeline_carat.json").exists());

        let cli = crate::cli::Cli::parse_from([
            "gem", "predict-carat", "--model-dir", m, "--price", "1500", "--cut", "Ideal",
            "--color", "E", "--clarity", "SI1", "--table", "56", "--x", "5.1", "--y", "5.1",
            "--z", "3.1",
        ]);
        let Command::PredictCarat(args) = cli.command else {
            panic!("expected predict-carat");
        };
        handle_predict_carat(args).unwrap();
    }
}
