//! Feature preprocessing.
//!
//! Every statistic (vocabulary, mean, scale) is learned from the partition the
//! transformer is fitted on and frozen afterwards. Cross-validation refits a
//! fresh transformer per fold.

pub mod encoder;
pub mod scaler;
pub mod transformer;

pub use encoder::*;
pub use scaler::*;
pub use transformer::*;
