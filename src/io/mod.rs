//! Input/output helpers.
//!
//! - dataset CSV ingest, train/test split (`ingest`)
//! - persisted pipelines (`artifact`)
//! - search result exports (`export`)

pub mod artifact;
pub mod export;
pub mod ingest;

pub use artifact::*;
pub use export::*;
pub use ingest::*;
