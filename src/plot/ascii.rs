//! ASCII bar charts for terminal output.
//!
//! Fixed-width and deterministic so output can be compared verbatim in tests.
//! Bars are drawn with `#`, scaled so the largest value fills `width`.

use crate::analysis::{DatasetSummary, GradeBreakdown, HistogramBin};

/// Render labelled horizontal bars.
pub fn render_bars(title: &str, rows: &[(String, f64)], width: usize) -> String {
    let width = width.max(1);
    let label_w = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = rows
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for (label, value) in rows {
        let len = bar_len(*value, max, width);
        let line = format!(
            "{label:<label_w$} | {}{} {}",
            "#".repeat(len),
            " ".repeat(width - len),
            fmt_value(*value)
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Grade counts as bars (the original analysis views' bar charts).
pub fn render_grade_counts(b: &GradeBreakdown, width: usize) -> String {
    let rows: Vec<(String, f64)> = b
        .levels
        .iter()
        .map(|l| (l.label.to_string(), l.count as f64))
        .collect();
    render_bars(&format!("Rows per {}:", b.column), &rows, width)
}

/// Mean price per grade level; empty levels are shown as zero.
pub fn render_grade_prices(b: &GradeBreakdown, width: usize) -> String {
    let rows: Vec<(String, f64)> = b
        .levels
        .iter()
        .map(|l| (l.label.to_string(), l.mean_price.unwrap_or(0.0)))
        .collect();
    render_bars(&format!("Average price per {}:", b.column), &rows, width)
}

pub fn render_histogram(bins: &[HistogramBin], width: usize) -> String {
    let rows: Vec<(String, f64)> = bins
        .iter()
        .map(|b| (format!("{:>6.0}-{:<6.0}", b.lo, b.hi), b.count as f64))
        .collect();
    render_bars("Price distribution:", &rows, width)
}

/// Every chart for a dataset summary, separated by blank lines.
pub fn render_summary_charts(summary: &DatasetSummary, width: usize) -> String {
    let parts = [
        render_grade_counts(&summary.cut, width),
        render_grade_counts(&summary.color, width),
        render_grade_counts(&summary.clarity, width),
        render_grade_prices(&summary.cut, width),
        render_grade_prices(&summary.color, width),
        render_grade_prices(&summary.clarity, width),
        render_histogram(&summary.price_histogram, width),
    ];
    parts.join("\n")
}

fn bar_len(value: f64, max: f64, width: usize) -> usize {
    if !(value.is_finite() && value > 0.0 && max > 0.0) {
        return 0;
    }
    ((value / max) * width as f64).round().clamp(0.0, width as f64) as usize
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GradeCount;

    #[test]
    fn bars_golden_snapshot_small() {
        let b = GradeBreakdown {
            column: "cut",
            levels: vec![
                GradeCount { label: "Ideal", count: 4, mean_price: Some(1000.0) },
                GradeCount { label: "Fair", count: 2, mean_price: Some(500.5) },
                GradeCount { label: "Good", count: 0, mean_price: None },
            ],
        };

        let txt = render_grade_counts(&b, 8);
        let expected = concat!(
            "Rows per cut:\n",
            "Ideal | ######## 4\n",
            "Fair  | ####     2\n",
            "Good  |          0\n",
        );
        assert_eq!(txt, expected);

        let txt = render_grade_prices(&b, 4);
        assert!(txt.contains("Fair  | ##   500.50"));
    }

    #[test]
    fn non_finite_values_draw_no_bar() {
        let txt = render_bars("t", &[("a".to_string(), f64::NAN), ("b".to_string(), 1.0)], 3);
        assert!(txt.contains("a |     NaN"));
        assert!(txt.contains("b | ### 1"));
    }
}
