//! Model search orchestration.
//!
//! Responsibilities:
//!
//! - enumerate hyperparameter grids per family (`grid`)
//! - split rows into cross-validation folds (`cv`)
//! - fit transformer + regressor pipelines (`pipeline`)
//! - cross-validate grids in parallel and pick the winner (`search`)

pub mod cv;
pub mod grid;
pub mod pipeline;
pub mod search;

pub use cv::*;
pub use grid::*;
pub use pipeline::*;
pub use search::*;
