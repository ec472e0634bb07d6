//! Reporting: formatted terminal output and the markdown training report.

pub mod bundle;
pub mod format;

pub use bundle::*;
pub use format::*;
