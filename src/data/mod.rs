//! Data sources other than the dataset file.

pub mod sample;

pub use sample::*;
