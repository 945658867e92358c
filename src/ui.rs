use anyhow::Result;
use chrono::NaiveDateTime;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mission_emissions::analyzers::aggregate::cumulative_emissions;
use mission_emissions::analyzers::palette::hex_to_rgb;
use mission_emissions::analyzers::selection::ModeSelection;
use mission_emissions::analyzers::types::{ChartData, RegionSeries};
use mission_emissions::mode::TravelMode;
use mission_emissions::records::{EnrichedTrip, trip_date};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};
use std::io;

pub struct App {
    pub trips: Vec<EnrichedTrip>,
    pub selection: ModeSelection,
    pub series: Vec<RegionSeries>,
    /// `(days since epoch, cumulative emissions)` per series, same order as `series`.
    plot_data: Vec<Vec<(f64, f64)>>,
    date_range: Option<(NaiveDateTime, NaiveDateTime)>,
    y_max: f64,
}

impl App {
    pub fn new(trips: Vec<EnrichedTrip>, selection: ModeSelection) -> Self {
        let mut app = Self {
            trips,
            selection,
            series: Vec::new(),
            plot_data: Vec::new(),
            date_range: None,
            y_max: 0.0,
        };
        app.recompute();
        app
    }

    pub fn toggle(&mut self, mode: TravelMode) {
        self.selection.toggle(mode);
        self.recompute();
    }

    pub fn select_all(&mut self) {
        self.selection = ModeSelection::all();
        self.recompute();
    }

    /// Rebuilds every series from the full trip list for the current selection.
    fn recompute(&mut self) {
        self.series = cumulative_emissions(&self.trips, &self.selection);

        self.plot_data = self
            .series
            .iter()
            .map(|s| {
                s.points
                    .iter()
                    .map(|p| (days(&p.date), p.cumulative))
                    .collect()
            })
            .collect();

        let dates = self.series.iter().flat_map(|s| s.points.iter().map(|p| p.date));
        self.date_range = dates.fold(None, |range, date| match range {
            None => Some((date, date)),
            Some((lo, hi)) => Some((lo.min(date), hi.max(date))),
        });

        self.y_max = self
            .series
            .iter()
            .map(RegionSeries::total)
            .fold(0.0, f64::max);
    }
}

fn days(date: &NaiveDateTime) -> f64 {
    date.and_utc().timestamp() as f64 / 86_400.0
}

fn series_color(series: &RegionSeries) -> Color {
    series
        .color
        .and_then(hex_to_rgb)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('a') => app.select_all(),
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    app.toggle(TravelMode::CONCRETE[index]);
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Mode checklist
            Constraint::Min(0),    // Chart
            Constraint::Length(1), // Key help
        ])
        .split(f.size());

    render_checklist(f, chunks[0], app);
    render_chart(f, chunks[1], app);

    let help = Paragraph::new("1-4 toggle mode · a select all · q quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[2]);
}

fn render_checklist(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    for (i, mode) in TravelMode::CONCRETE.iter().enumerate() {
        let checked = app.selection.contains(*mode);
        let mark = if checked { "[x]" } else { "[ ]" };
        let style = if checked {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{mark} {} {}", i + 1, mode.label()), style));
        spans.push(Span::raw("   "));
    }

    let checklist = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Travel modes"));
    f.render_widget(checklist, area);
}

fn render_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Cumulative emissions per region");

    let Some((first, last)) = app.date_range else {
        let empty = Paragraph::new("No missions for the selected travel modes").block(block);
        f.render_widget(empty, area);
        return;
    };

    let datasets = app
        .series
        .iter()
        .zip(&app.plot_data)
        .map(|(series, data)| {
            Dataset::default()
                .name(series.region.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(series)))
                .data(data)
        })
        .collect();

    // Pad a single-day range so the axis keeps a width
    let (x_min, mut x_max) = (days(&first), days(&last));
    if x_max <= x_min {
        x_max = x_min + 1.0;
    }
    let middle = first + (last - first) / 2;
    let y_max = if app.y_max > 0.0 { app.y_max * 1.05 } else { 1.0 };

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(ChartData::X_LABEL)
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(trip_date::format(&first)),
                    Span::raw(trip_date::format(&middle)),
                    Span::raw(trip_date::format(&last)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(ChartData::Y_LABEL)
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{:.0}", y_max / 2.0)),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        );

    f.render_widget(chart, area);
}
