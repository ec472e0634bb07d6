//! Regressor families.
//!
//! Every family fits on a dense design matrix (rows = samples) produced by the
//! column transformer and predicts one value per row.

pub mod boosting;
pub mod forest;
pub mod knn;
pub mod lasso;
pub mod linear;
pub mod oblivious;
pub mod regressor;
pub mod tree;

pub use boosting::*;
pub use forest::*;
pub use knn::*;
pub use lasso::*;
pub use linear::*;
pub use oblivious::*;
pub use regressor::*;
pub use tree::*;
