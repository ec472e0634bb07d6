//! Dataset summaries shown by `gem analyze` and the TUI analysis tab.
//!
//! Grade breakdowns always list every level in canonical order (best first),
//! including levels with no rows, so charts keep a stable x axis.

use serde::Serialize;

use crate::domain::{Clarity, Color, Cut, Grade, Record};
use crate::error::AppError;

/// Row count and mean price for one grade level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeCount {
    pub label: &'static str,
    pub count: usize,
    /// `None` when the level has no rows.
    pub mean_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeBreakdown {
    pub column: &'static str,
    pub levels: Vec<GradeCount>,
}

impl GradeBreakdown {
    pub fn max_count(&self) -> usize {
        self.levels.iter().map(|l| l.count).max().unwrap_or(0)
    }
}

/// Half-open price bin `[lo, hi)`; the last bin also includes `hi`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub n_rows: usize,
    pub price_min: f64,
    pub price_max: f64,
    pub price_mean: f64,
    pub carat_mean: f64,
    pub cut: GradeBreakdown,
    pub color: GradeBreakdown,
    pub clarity: GradeBreakdown,
    pub price_histogram: Vec<HistogramBin>,
}

/// Count rows (and average price) per level of one grade.
pub fn breakdown<G: Grade>(records: &[Record], grade_of: impl Fn(&Record) -> G) -> GradeBreakdown {
    let mut counts = vec![0usize; G::ALL.len()];
    let mut sums = vec![0.0f64; G::ALL.len()];
    for r in records {
        let rank = grade_of(r).rank();
        if let Some(slot) = counts.get_mut(rank) {
            *slot += 1;
            sums[rank] += f64::from(r.price);
        }
    }

    let levels = G::ALL
        .iter()
        .enumerate()
        .map(|(i, g)| GradeCount {
            label: g.label(),
            count: counts[i],
            mean_price: (counts[i] > 0).then(|| sums[i] / counts[i] as f64),
        })
        .collect();

    GradeBreakdown {
        column: G::COLUMN,
        levels,
    }
}

/// Equal-width price histogram over the observed range.
pub fn price_histogram(records: &[Record], bins: usize) -> Vec<HistogramBin> {
    if records.is_empty() || bins == 0 {
        return Vec::new();
    }
    let (lo, hi) = price_range(records);
    let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lo: lo + i as f64 * width,
            hi: lo + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for r in records {
        let p = f64::from(r.price);
        let idx = (((p - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

fn price_range(records: &[Record]) -> (f64, f64) {
    records.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| {
        let p = f64::from(r.price);
        (lo.min(p), hi.max(p))
    })
}

/// Full summary of a loaded dataset.
pub fn summarize(records: &[Record], bins: usize) -> Result<DatasetSummary, AppError> {
    if records.is_empty() {
        return Err(AppError::data("Cannot summarize an empty dataset."));
    }
    let n = records.len() as f64;
    let (price_min, price_max) = price_range(records);

    Ok(DatasetSummary {
        n_rows: records.len(),
        price_min,
        price_max,
        price_mean: records.iter().map(|r| f64::from(r.price)).sum::<f64>() / n,
        carat_mean: records.iter().map(|r| r.carat).sum::<f64>() / n,
        cut: breakdown::<Cut>(records, |r| r.cut),
        color: breakdown::<Color>(records, |r| r.color),
        clarity: breakdown::<Clarity>(records, |r| r.clarity),
        price_histogram: price_histogram(records, bins),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cut: Cut, color: Color, clarity: Clarity, price: u32) -> Record {
        Record {
            carat: 0.5,
            cut,
            color,
            clarity,
            depth: 61.5,
            table: 55.0,
            price,
            x: 5.0,
            y: 5.0,
            z: 3.1,
        }
    }

    fn fixture() -> Vec<Record> {
        vec![
            record(Cut::Fair, Color::J, Clarity::I1, 400),
            record(Cut::Ideal, Color::D, Clarity::If, 1000),
            record(Cut::Ideal, Color::E, Clarity::Si1, 2000),
            record(Cut::Good, Color::E, Clarity::Si1, 3000),
        ]
    }

    #[test]
    fn breakdown_lists_every_level_in_canonical_order() {
        let cut = breakdown::<Cut>(&fixture(), |r| r.cut);
        let labels: Vec<&str> = cut.levels.iter().map(|l| l.label).collect();
        assert_eq!(labels, vec!["Ideal", "Premium", "Very Good", "Good", "Fair"]);
        let counts: Vec<usize> = cut.levels.iter().map(|l| l.count).collect();
        assert_eq!(counts, vec![2, 0, 0, 1, 1]);
        assert_eq!(cut.levels[0].mean_price, Some(1500.0));
        assert_eq!(cut.levels[1].mean_price, None);
        assert_eq!(cut.max_count(), 2);
    }

    #[test]
    fn histogram_covers_every_row() {
        let bins = price_histogram(&fixture(), 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert!((bins[0].lo - 400.0).abs() < 1e-12);
        assert!((bins[3].hi - 3000.0).abs() < 1e-9);
        // The maximum lands in the last bin.
        assert_eq!(bins[3].count, 1);
    }

    #[test]
    fn histogram_of_constant_prices_uses_one_bin() {
        let records = vec![record(Cut::Ideal, Color::D, Clarity::If, 500); 3];
        let bins = price_histogram(&records, 5);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn summarize_rejects_empty_input() {
        assert!(summarize(&[], 10).is_err());
        let s = summarize(&fixture(), 10).unwrap();
        assert_eq!(s.n_rows, 4);
        assert!((s.price_mean - 1600.0).abs() < 1e-12);
        assert_eq!(s.clarity.levels.len(), 8);
    }
}
