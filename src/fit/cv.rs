//! K-fold partitioning.

use crate::error::AppError;

/// Row indices of one cross-validation split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Unshuffled contiguous folds. The first `n % k` folds hold one extra row.
pub fn kfold(n: usize, k: usize) -> Result<Vec<Fold>, AppError> {
    if k < 2 {
        return Err(AppError::invalid_input(format!(
            "Cross-validation needs at least 2 folds (got {k})."
        )));
    }
    if n < k {
        return Err(AppError::data(format!(
            "Cannot split {n} rows into {k} folds."
        )));
    }

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let size = base + usize::from(i < extra);
        let end = start + size;
        folds.push(Fold {
            train: (0..start).chain(end..n).collect(),
            test: (start..end).collect(),
        });
        start = end;
    }
    Ok(folds)
}
