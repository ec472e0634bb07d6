//! Persisted pipeline read/write.
//!
//! A pipeline is stored as one JSON document. Retraining overwrites the file
//! wholesale; there is no versioning or migration.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Write};
use std::path::Path;

use crate::error::AppError;
use crate::fit::TrainedPipeline;

/// Serialize `pipeline` to `path`, creating the parent directory if needed.
pub fn save_pipeline(path: &Path, pipeline: &TrainedPipeline) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::io(format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }

    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, pipeline).map_err(|e| {
        AppError::artifact(format!("Failed to serialize pipeline to '{}': {e}", path.display()))
    })?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;

    log::info!(
        "saved {} pipeline ({}) to {}",
        pipeline.target.display_name(),
        pipeline.model.params(),
        path.display()
    );
    Ok(())
}

/// Load a pipeline. A missing file is an I/O error; anything that does not
/// decode is an artifact error. Never falls back to a default model.
pub fn load_pipeline(path: &Path) -> Result<TrainedPipeline, AppError> {
    let file = File::open(path).map_err(|e| {
        let hint = if e.kind() == IoErrorKind::NotFound {
            " Run `gem train` first."
        } else {
            ""
        };
        AppError::io(format!(
            "Failed to open pipeline '{}': {e}.{hint}",
            path.display()
        ))
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::artifact(format!("Corrupt pipeline '{}': {e}", path.display()))
    })
}
