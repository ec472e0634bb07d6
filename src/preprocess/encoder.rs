//! One-hot encoding with the first level of each column dropped.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{Frame, grade_level};
use crate::error::AppError;

/// Vocabulary of one encoded column.
///
/// `categories[0]` is the reference level: it is dropped from the output, so a
/// row holding it encodes as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub name: String,
    pub categories: Vec<String>,
}

impl EncodedColumn {
    pub fn width(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<EncodedColumn>,
}

/// Grade columns are stored under their canonical label so that `very good`
/// and `Very Good` land on the same level.
fn canonical(column: &str, raw: &str) -> (String, usize) {
    match grade_level(column, raw) {
        Some((label, rank)) => (label.to_string(), rank),
        None => (raw.trim().to_string(), usize::MAX),
    }
}

impl OneHotEncoder {
    /// Learn each column's vocabulary from the fit partition.
    ///
    /// Levels are ordered by grade rank (best first); values outside a grade
    /// scale sort after it, alphabetically.
    pub fn fit(frame: &Frame, columns: &[&str]) -> Result<Self, AppError> {
        let mut out = Vec::with_capacity(columns.len());
        for &name in columns {
            let values = frame.categorical(name)?;
            let mut levels: Vec<(usize, String)> = values
                .iter()
                .map(|v| {
                    let (label, rank) = canonical(name, v);
                    (rank, label)
                })
                .collect();
            levels.sort();
            levels.dedup();

            out.push(EncodedColumn {
                name: name.to_string(),
                categories: levels.into_iter().map(|(_, label)| label).collect(),
            });
        }
        Ok(Self { columns: out })
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    /// Number of output columns.
    pub fn width(&self) -> usize {
        self.columns.iter().map(EncodedColumn::width).sum()
    }

    /// Output column names, `column_level` for every non-reference level.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| {
                c.categories
                    .iter()
                    .skip(1)
                    .map(move |level| format!("{}_{}", c.name, level))
            })
            .collect()
    }

    pub fn transform(&self, frame: &Frame) -> Result<DMatrix<f64>, AppError> {
        let n = frame.n_rows();
        let mut out = DMatrix::zeros(n, self.width());

        let mut offset = 0;
        for col in &self.columns {
            let values = frame.categorical(&col.name)?;
            for (row, raw) in values.iter().enumerate() {
                let (label, _) = canonical(&col.name, raw);
                let level = col
                    .categories
                    .iter()
                    .position(|c| *c == label)
                    .ok_or_else(|| AppError::unknown_category(&col.name, raw.trim()))?;
                if level > 0 {
                    out[(row, offset + level - 1)] = 1.0;
                }
            }
            offset += col.width();
        }

        Ok(out)
    }
}
