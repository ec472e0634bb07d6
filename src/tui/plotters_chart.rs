//! Plotters-powered bar chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`. Category labels are drawn by the caller with
//! plain Ratatui text since terminal cells are too coarse for rotated or
//! crowded Plotters labels.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Render-only description of a categorical bar chart.
///
/// Bar `i` is centered on x = `i`; the x range is `[-0.5, n - 0.5]`.
pub struct GradeBarChart<'a> {
    pub values: &'a [f64],
    pub y_label: &'a str,
    pub fmt_y: fn(f64) -> String,
}

impl GradeBarChart<'_> {
    /// Upper y bound with headroom above the tallest bar.
    pub fn y_max(values: &[f64]) -> f64 {
        let max = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0f64, f64::max);
        if max > 0.0 { max * 1.1 } else { 1.0 }
    }
}

impl Widget for GradeBarChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }
        if self.values.is_empty() {
            return;
        }

        let n = self.values.len() as f64;
        let y_max = Self::y_max(self.values);

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 1)
                .build_cartesian_2d(-0.5..n - 0.5, 0.0..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(5)
                .y_desc(self.y_label)
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let bar_color = RGBColor(0, 255, 255);
            chart.draw_series(self.values.iter().enumerate().filter(|(_, v)| v.is_finite()).map(
                |(i, &v)| {
                    let x = i as f64;
                    Rectangle::new([(x - 0.35, 0.0), (x + 0.35, v)], bar_color.filled())
                },
            ))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
