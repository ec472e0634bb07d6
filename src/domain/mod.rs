//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - ordered quality grades (`Cut`, `Color`, `Clarity`) and dataset `Record`s
//! - prediction directions (`Target`) and their feature schemas
//! - the named-column `Frame` shared by training and inference
//! - run configuration (`TrainConfig`, `Paths`)

pub mod frame;
pub mod types;

pub use frame::*;
pub use types::*;
