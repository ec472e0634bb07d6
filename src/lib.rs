//! `gem-predictor` library crate.
//!
//! The binary (`gem`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the training pipeline, prediction service and TUI share one code path

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod predict;
pub mod preprocess;
pub mod report;
pub mod tui;
