//! Ratatui-based terminal UI.
//!
//! Four tabs: the loaded dataset, analysis charts, and one prediction form
//! per direction. The dataset is read once by the caller and handed in; the
//! persisted pipelines are loaded on every submission so a retrain is picked
//! up without restarting.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs},
};

use crate::analysis::{DatasetSummary, GradeBreakdown, summarize};
use crate::domain::{Grade, Paths, Record, Target};
use crate::error::AppError;
use crate::predict::PredictionService;

pub mod form;
mod plotters_chart;

use form::{FieldKind, Form, FormError};
use plotters_chart::GradeBarChart;

/// Histogram bins shown on the analysis tab.
const HISTOGRAM_BINS: usize = 12;

/// Everything the TUI needs, prepared by the caller.
pub struct TuiContext {
    pub paths: Paths,
    pub records: Vec<Record>,
    /// Shown in the status bar at startup (e.g. why the dataset is empty).
    pub status: String,
}

/// Start the TUI.
pub fn run(ctx: TuiContext) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(ctx);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!(
                "Failed to enter alternate screen: {e}"
            )));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Dataset,
    Analysis,
    PredictPrice,
    PredictCarat,
}

impl Tab {
    const ALL: [Tab; 4] = [Tab::Dataset, Tab::Analysis, Tab::PredictPrice, Tab::PredictCarat];

    fn title(self) -> &'static str {
        match self {
            Tab::Dataset => "Dataset",
            Tab::Analysis => "Analysis",
            Tab::PredictPrice => "Predict Price",
            Tab::PredictCarat => "Predict Carat",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn step(self, forward: bool) -> Tab {
        let n = Tab::ALL.len();
        let i = self.index();
        Tab::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }]
    }
}

/// Charts selectable on the analysis tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartKind {
    Counts(GradeColumn),
    MeanPrice(GradeColumn),
    PriceHistogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GradeColumn {
    Cut,
    Color,
    Clarity,
}

const CHARTS: [ChartKind; 7] = [
    ChartKind::Counts(GradeColumn::Cut),
    ChartKind::Counts(GradeColumn::Color),
    ChartKind::Counts(GradeColumn::Clarity),
    ChartKind::MeanPrice(GradeColumn::Cut),
    ChartKind::MeanPrice(GradeColumn::Color),
    ChartKind::MeanPrice(GradeColumn::Clarity),
    ChartKind::PriceHistogram,
];

#[derive(Debug, Clone)]
enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    fn style(&self) -> Style {
        match self {
            Notice::Info(_) => Style::default().fg(Color::Green),
            Notice::Warning(_) => Style::default().fg(Color::Yellow),
            Notice::Error(_) => Style::default().fg(Color::Red),
        }
    }

    fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Warning(s) | Notice::Error(s) => s,
        }
    }
}

struct App {
    paths: Paths,
    records: Vec<Record>,
    summary: Option<DatasetSummary>,
    tab: Tab,
    row_offset: usize,
    chart: usize,
    price_form: Form,
    carat_form: Form,
    price_notice: Option<Notice>,
    carat_notice: Option<Notice>,
    status: String,
}

impl App {
    fn new(ctx: TuiContext) -> Self {
        let summary = summarize(&ctx.records, HISTOGRAM_BINS).ok();
        Self {
            paths: ctx.paths,
            records: ctx.records,
            summary,
            tab: Tab::Dataset,
            row_offset: 0,
            chart: 0,
            price_form: Form::new(Target::Price),
            carat_form: Form::new(Target::Carat),
            price_notice: None,
            carat_notice: None,
            status: ctx.status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::terminal(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::terminal(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.tab = self.tab.step(true),
            KeyCode::BackTab => self.tab = self.tab.step(false),
            _ => match self.tab {
                Tab::Dataset => self.handle_dataset_key(code),
                Tab::Analysis => self.handle_analysis_key(code),
                Tab::PredictPrice | Tab::PredictCarat => self.handle_form_key(code),
            },
        }
        false
    }

    fn handle_dataset_key(&mut self, code: KeyCode) {
        let last = self.records.len().saturating_sub(1);
        self.row_offset = match code {
            KeyCode::Down => self.row_offset.saturating_add(1),
            KeyCode::Up => self.row_offset.saturating_sub(1),
            KeyCode::PageDown => self.row_offset.saturating_add(20),
            KeyCode::PageUp => self.row_offset.saturating_sub(20),
            KeyCode::Home => 0,
            KeyCode::End => last,
            _ => self.row_offset,
        }
        .min(last);
    }

    fn handle_analysis_key(&mut self, code: KeyCode) {
        let n = CHARTS.len();
        match code {
            KeyCode::Right | KeyCode::Down => self.chart = (self.chart + 1) % n,
            KeyCode::Left | KeyCode::Up => self.chart = (self.chart + n - 1) % n,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        let target = if self.tab == Tab::PredictPrice {
            Target::Price
        } else {
            Target::Carat
        };
        let form = match target {
            Target::Price => &mut self.price_form,
            Target::Carat => &mut self.carat_form,
        };
        match code {
            KeyCode::Down => form.focus_next(),
            KeyCode::Up => form.focus_prev(),
            KeyCode::Right => form.cycle(true),
            KeyCode::Left => form.cycle(false),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Delete => form.clear(),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Enter => {
                let notice = self.submit(target);
                match target {
                    Target::Price => self.price_notice = notice,
                    Target::Carat => self.carat_notice = notice,
                }
            }
            _ => {}
        }
    }

    /// Run one prediction. A missing field yields a warning and no prediction.
    fn submit(&self, target: Target) -> Option<Notice> {
        let result = match target {
            Target::Price => self.price_form.price_input().and_then(|input| {
                self.predict(target, |svc| Ok(svc.predict_price(&input)?.to_string()))
            }),
            Target::Carat => self.carat_form.carat_input().and_then(|input| {
                self.predict(target, |svc| Ok(svc.predict_carat(&input)?.to_string()))
            }),
        };
        Some(match result {
            Ok(message) => Notice::Info(message),
            Err(err) if err.is_warning() => Notice::Warning(err.to_string()),
            Err(err) => {
                log::warn!("{} prediction failed: {err}", target.display_name());
                Notice::Error(err.to_string())
            }
        })
    }

    fn predict(
        &self,
        target: Target,
        f: impl FnOnce(&PredictionService) -> Result<String, AppError>,
    ) -> Result<String, FormError> {
        let service = PredictionService::load(self.paths.model_path(target), target)?;
        Ok(f(&service)?)
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_tabs(frame, chunks[0]);
        match self.tab {
            Tab::Dataset => self.draw_dataset(frame, chunks[1]),
            Tab::Analysis => self.draw_analysis(frame, chunks[1]),
            Tab::PredictPrice => {
                draw_form(frame, chunks[1], &self.price_form, self.price_notice.as_ref())
            }
            Tab::PredictCarat => {
                draw_form(frame, chunks[1], &self.carat_form, self.carat_notice.as_ref())
            }
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .block(Block::default().title("gem").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_dataset(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(format!(
                "{} ({} rows)",
                self.paths.dataset.display(),
                self.records.len()
            ))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.records.is_empty() {
            let msg = Paragraph::new("No dataset loaded.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let visible = inner.height.saturating_sub(1) as usize;
        let end = (self.row_offset + visible).min(self.records.len());
        let rows: Vec<Row> = self.records[self.row_offset..end]
            .iter()
            .map(|r| Row::new(record_cells(r)))
            .collect();

        let header = Row::new(
            crate::domain::DATASET_COLUMNS
                .iter()
                .map(|c| Cell::from(*c))
                .collect::<Vec<_>>(),
        )
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

        let widths = [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
        ];
        frame.render_widget(Table::new(rows, widths).header(header), inner);
    }

    fn draw_analysis(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let kind = CHARTS[self.chart];
        let block = Block::default()
            .title(format!("{} ({}/{})", chart_title(kind), self.chart + 1, CHARTS.len()))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(summary) = &self.summary else {
            let msg = Paragraph::new("No dataset loaded.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        let header = format!(
            "rows={} | price=[{:.0}, {:.0}] mean={:.2} | mean carat={:.3}",
            summary.n_rows,
            summary.price_min,
            summary.price_max,
            summary.price_mean,
            summary.carat_mean
        );
        frame.render_widget(
            Paragraph::new(header).style(Style::default().fg(Color::Gray)),
            chunks[0],
        );

        let (labels, values) = chart_series(summary, kind);
        let (y_label, fmt_y): (&str, fn(f64) -> String) = match kind {
            ChartKind::MeanPrice(_) => ("avg price", fmt_axis_price),
            _ => ("rows", fmt_axis_count),
        };
        frame.render_widget(
            GradeBarChart {
                values: &values,
                y_label,
                fmt_y,
            },
            chunks[1],
        );
        draw_category_labels(frame, chunks[1], chunks[2], &labels);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.tab {
            Tab::Dataset => "Tab switch  ↑/↓ PgUp/PgDn scroll  q quit",
            Tab::Analysis => "Tab switch  ←/→ chart  q quit",
            Tab::PredictPrice | Tab::PredictCarat => {
                "Tab switch  ↑/↓ field  ←/→ choose  type digits  Enter predict  Del clear  q quit"
            }
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn record_cells(r: &Record) -> Vec<String> {
    vec![
        format!("{:.2}", r.carat),
        r.cut.label().to_string(),
        r.color.label().to_string(),
        r.clarity.label().to_string(),
        format!("{:.1}", r.depth),
        format!("{:.1}", r.table),
        r.price.to_string(),
        format!("{:.2}", r.x),
        format!("{:.2}", r.y),
        format!("{:.2}", r.z),
    ]
}

fn draw_form(frame: &mut ratatui::Frame<'_>, area: Rect, form: &Form, notice: Option<&Notice>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for (idx, spec) in form.fields().iter().enumerate() {
        let focused = idx == form.focus();
        let value = form.display_value(idx);
        let hint = match spec.kind {
            FieldKind::Number(r) => format!("{} - {}", r.min, r.max),
            FieldKind::Choice(opts) => opts.join(" / "),
        };
        let shown = if value.is_empty() {
            Span::styled("<empty>", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(value, Style::default().fg(Color::White))
        };
        let marker = if focused { "» " } else { "  " };
        let label_style = if focused {
            Style::default().fg(Color::Black).bg(Color::White)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<12}", spec.label), label_style),
            Span::raw(" "),
            shown,
            Span::styled(format!("   ({hint})"), Style::default().fg(Color::Gray)),
        ]));
    }

    let title = format!("{} prediction", form.target().display_name());
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().title(title).borders(Borders::ALL)),
        chunks[0],
    );

    let (text, style) = match notice {
        Some(n) => (n.text().to_string(), n.style()),
        None => (
            "Fill every field and press Enter.".to_string(),
            Style::default().fg(Color::Gray),
        ),
    };
    frame.render_widget(
        Paragraph::new(text)
            .style(style)
            .block(Block::default().title("Result").borders(Borders::ALL)),
        chunks[1],
    );
}

fn breakdown_for(summary: &DatasetSummary, grade: GradeColumn) -> &GradeBreakdown {
    match grade {
        GradeColumn::Cut => &summary.cut,
        GradeColumn::Color => &summary.color,
        GradeColumn::Clarity => &summary.clarity,
    }
}

fn chart_title(kind: ChartKind) -> String {
    let grade_name = |g: GradeColumn| match g {
        GradeColumn::Cut => "cut",
        GradeColumn::Color => "color",
        GradeColumn::Clarity => "clarity",
    };
    match kind {
        ChartKind::Counts(g) => format!("Rows per {}", grade_name(g)),
        ChartKind::MeanPrice(g) => format!("Average price per {}", grade_name(g)),
        ChartKind::PriceHistogram => "Price distribution".to_string(),
    }
}

/// Category labels and bar heights for one chart.
fn chart_series(summary: &DatasetSummary, kind: ChartKind) -> (Vec<String>, Vec<f64>) {
    match kind {
        ChartKind::Counts(g) => breakdown_for(summary, g)
            .levels
            .iter()
            .map(|l| (l.label.to_string(), l.count as f64))
            .unzip(),
        ChartKind::MeanPrice(g) => breakdown_for(summary, g)
            .levels
            .iter()
            .map(|l| (l.label.to_string(), l.mean_price.unwrap_or(0.0)))
            .unzip(),
        ChartKind::PriceHistogram => summary
            .price_histogram
            .iter()
            .map(|b| (format!("{:.0}", b.lo), b.count as f64))
            .unzip(),
    }
}

fn fmt_axis_count(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_price(v: f64) -> String {
    format!("${v:.0}")
}

/// Write category labels under the bars. Plot margins are approximated by
/// the chart's label area (8 columns) and outer margin (1).
fn draw_category_labels(frame: &mut ratatui::Frame<'_>, chart: Rect, row: Rect, labels: &[String]) {
    if labels.is_empty() || chart.width < 20 {
        return;
    }
    let left = chart.x + 9;
    let plot_w = chart.width.saturating_sub(10) as f64;
    let slot = plot_w / labels.len() as f64;
    let style = Style::default().fg(Color::Gray);

    for (i, label) in labels.iter().enumerate() {
        let center = left as f64 + slot * (i as f64 + 0.5);
        let len = label.chars().count() as u16;
        let start = (center - len as f64 / 2.0).max(chart.x as f64) as u16;
        if start + len > row.x + row.width {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label.as_str()).style(style),
            Rect {
                x: start,
                y: row.y,
                width: len,
                height: 1,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_records};

    fn app(records: Vec<Record>, dir: &std::path::Path) -> App {
        App::new(TuiContext {
            paths: Paths {
                dataset: dir.join("diamonds.csv"),
                artifact_dir: dir.join("artifact"),
                price_model: dir.join("price.json"),
                carat_model: dir.join("carat.json"),
            },
            records,
            status: String::new(),
        })
    }

    #[test]
    fn tabs_cycle_both_ways() {
        assert_eq!(Tab::Dataset.step(true), Tab::Analysis);
        assert_eq!(Tab::Dataset.step(false), Tab::PredictCarat);
        assert_eq!(Tab::PredictCarat.step(true), Tab::Dataset);
    }

    #[test]
    fn chart_series_follow_canonical_order() {
        let records = generate_records(&SampleConfig { rows: 200, seed: 1 }).unwrap();
        let summary = summarize(&records, HISTOGRAM_BINS).unwrap();
        let (labels, values) = chart_series(&summary, ChartKind::Counts(GradeColumn::Cut));
        assert_eq!(labels, vec!["Ideal", "Premium", "Very Good", "Good", "Fair"]);
        assert_eq!(values.iter().sum::<f64>(), 200.0);
        let (labels, _) = chart_series(&summary, ChartKind::PriceHistogram);
        assert_eq!(labels.len(), HISTOGRAM_BINS);
    }

    #[test]
    fn incomplete_form_submission_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(Vec::new(), dir.path());
        match app.submit(Target::Price) {
            Some(Notice::Warning(msg)) => assert_eq!(msg, "Please fill the Carat field."),
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn missing_artifact_is_reported_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(Vec::new(), dir.path());
        app.tab = Tab::PredictCarat;
        let form = &mut app.carat_form;
        form.set_choice("cut", "Ideal");
        form.set_choice("color", "E");
        form.set_choice("clarity", "SI1");
        for (name, v) in [("depth", "61.5"), ("table", "55"), ("price", "1500"), ("x", "5.1"), ("y", "5.1"), ("z", "3.1")] {
            form.set_text(name, v);
        }
        app.handle_form_key(KeyCode::Enter);
        match &app.carat_notice {
            Some(Notice::Error(msg)) => assert!(msg.contains("gem train")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn dataset_scroll_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let records = generate_records(&SampleConfig { rows: 5, seed: 1 }).unwrap();
        let mut app = app(records, dir.path());
        app.handle_dataset_key(KeyCode::PageDown);
        assert_eq!(app.row_offset, 4);
        app.handle_dataset_key(KeyCode::Home);
        assert_eq!(app.row_offset, 0);
    }
}
