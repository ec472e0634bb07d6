//! Online inference: form inputs, feature preparation, and the prediction
//! service over a persisted pipeline.

pub mod features;
pub mod service;

pub use features::*;
pub use service::*;
