//! Terminal renderer for dashboard frames.
//!
//! Runs as its own task and draws whatever frame is current on the watch
//! channel with ratatui. Intermediate frames published while a draw is in
//! progress are skipped. The terminal is left in cooked mode so Ctrl-C still
//! reaches the process as a signal.

use std::io::{self, Stdout};

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use is_terminal::IsTerminal;
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config;
use crate::dashboard::{ChartPoint, ConnectionStatus, Frame as DashboardFrame, PanelContent, NO_ACTIVE_ALERTS};
use crate::models::{display_number, AlertKind};

// ---

/// Colors used by the widgets. With color off every style keeps only its
/// modifiers, so the layout is identical either way.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    color: bool,
}

impl Theme {
    // ---
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn fg(self, color: Color) -> Style {
        if self.color {
            Style::default().fg(color)
        } else {
            Style::default()
        }
    }

    fn alert(self, kind: AlertKind) -> Style {
        match kind {
            AlertKind::Danger => self.fg(Color::Red).add_modifier(Modifier::BOLD),
            AlertKind::Warning => self.fg(Color::Yellow),
        }
    }

    fn emergency(self) -> Style {
        let style = Style::default().add_modifier(Modifier::BOLD);
        if self.color {
            style.fg(Color::White).bg(Color::Red)
        } else {
            style.add_modifier(Modifier::REVERSED)
        }
    }
}

/// Spawn the render loop. It ends when the dashboard (the sender) is dropped.
///
/// Without a terminal on stdout nothing is drawn; frames are only traced.
pub fn spawn(frames: watch::Receiver<DashboardFrame>) -> JoinHandle<()> {
    // ---
    tokio::spawn(async move {
        if !io::stdout().is_terminal() {
            info!("stdout is not a terminal, dashboard drawing disabled");
            trace_frames(frames).await;
            return;
        }
        let theme = Theme::new(config::use_color(true));
        if let Err(e) = run_terminal(frames, theme).await {
            warn!("Renderer stopped: {}", e);
        }
        debug!("Render loop finished");
    })
}

async fn trace_frames(mut frames: watch::Receiver<DashboardFrame>) {
    // ---
    while frames.changed().await.is_ok() {
        let frame = frames.borrow_and_update().clone();
        debug!(slots = ?frame.slots, connection = ?frame.connection, emergency = ?frame.emergency, "frame");
    }
}

async fn run_terminal(frames: watch::Receiver<DashboardFrame>, theme: Theme) -> io::Result<()> {
    // ---
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal: Terminal<CrosstermBackend<Stdout>> = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.hide_cursor()?;

    let result = draw_frames(&mut terminal, frames, theme).await;

    // Restore terminal
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// Draw every frame the channel yields until the sender is dropped.
pub async fn draw_frames<B: Backend>(
    terminal: &mut Terminal<B>,
    mut frames: watch::Receiver<DashboardFrame>,
    theme: Theme,
) -> io::Result<()> {
    // ---
    while frames.changed().await.is_ok() {
        let snapshot = frames.borrow_and_update().clone();
        terminal.draw(|f| draw(f, &snapshot, theme))?;
    }
    Ok(())
}

enum Section<'a> {
    Emergency,
    Vitals,
    Chart(&'a [ChartPoint]),
    Alerts(&'a PanelContent),
    Status,
}

impl Section<'_> {
    fn constraint(&self) -> Constraint {
        match self {
            Section::Emergency | Section::Vitals => Constraint::Length(3),
            Section::Chart(_) => Constraint::Min(8),
            Section::Alerts(PanelContent::Alerts(entries)) => Constraint::Length(entries.len() as u16 + 2),
            Section::Alerts(_) => Constraint::Length(3),
            Section::Status => Constraint::Length(1),
        }
    }
}

/// Lay one dashboard frame out on the terminal.
pub fn draw(f: &mut Frame, frame: &DashboardFrame, theme: Theme) {
    // ---
    let mut sections = Vec::new();
    if frame.emergency == Some(true) {
        sections.push(Section::Emergency);
    }
    if !frame.slots.is_empty() {
        sections.push(Section::Vitals);
    }
    if let Some(points) = &frame.chart {
        sections.push(Section::Chart(points.as_slice()));
    }
    if let Some(panel) = &frame.alerts {
        sections.push(Section::Alerts(panel));
    }
    sections.push(Section::Status);

    let areas = Layout::vertical(sections.iter().map(Section::constraint)).split(f.area());
    for (section, &area) in sections.iter().zip(areas.iter()) {
        match section {
            Section::Emergency => draw_emergency(f, area, theme),
            Section::Vitals => draw_vitals(f, area, frame, theme),
            Section::Chart(points) => draw_chart(f, area, points, theme),
            Section::Alerts(panel) => draw_alerts(f, area, panel, theme),
            Section::Status => draw_status(f, area, frame.connection, theme),
        }
    }
}

fn draw_emergency(f: &mut Frame, area: Rect, theme: Theme) {
    let banner = Paragraph::new("!!! EMERGENCY !!!")
        .style(theme.emergency())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(theme.fg(Color::Red)));
    f.render_widget(banner, area);
}

fn draw_vitals(f: &mut Frame, area: Rect, frame: &DashboardFrame, theme: Theme) {
    // ---
    let mut spans = Vec::new();
    for (i, (slot, text)) in frame.slots.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  |  ", theme.fg(Color::DarkGray)));
        }
        let value = if text.is_empty() { "--" } else { text.as_str() };
        spans.push(Span::styled(
            format!("{} ", slot.caption()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(value.to_string(), theme.fg(Color::Cyan)));
        spans.push(Span::styled(format!(" {}", slot.unit()), theme.fg(Color::Gray)));
    }
    let vitals = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(" Vitals "));
    f.render_widget(vitals, area);
}

fn draw_chart(f: &mut Frame, area: Rect, points: &[ChartPoint], theme: Theme) {
    // ---
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        let placeholder = Paragraph::new("Waiting for readings")
            .alignment(Alignment::Center)
            .style(theme.fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Heart rate & sugar "));
        f.render_widget(placeholder, area);
        return;
    };

    let heart: Vec<(f64, f64)> = points.iter().enumerate().map(|(i, p)| (i as f64, p.heart_rate)).collect();
    let sugar: Vec<(f64, f64)> = points.iter().enumerate().map(|(i, p)| (i as f64, p.sugar_level)).collect();

    let (y_min, y_max) = heart
        .iter()
        .chain(sugar.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
    let (y_min, y_max) = (y_min - 5.0, y_max + 5.0);
    let x_max = (points.len() as f64 - 1.0).max(1.0);

    let datasets = vec![
        Dataset::default()
            .name(format!("HR {}", display_number(last.heart_rate)))
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme.fg(Color::Red))
            .data(&heart),
        Dataset::default()
            .name(format!("Sugar {}", display_number(last.sugar_level)))
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme.fg(Color::Green))
            .data(&sugar),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Heart rate & sugar ({} points) ", points.len())),
        )
        .x_axis(
            Axis::default()
                .style(theme.fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![Span::raw(first.label.clone()), Span::raw(last.label.clone())]),
        )
        .y_axis(
            Axis::default()
                .style(theme.fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.0}", y_min)),
                    Span::raw(format!("{:.0}", (y_min + y_max) / 2.0)),
                    Span::raw(format!("{:.0}", y_max)),
                ]),
        );
    f.render_widget(chart, area);
}

fn draw_alerts(f: &mut Frame, area: Rect, panel: &PanelContent, theme: Theme) {
    // ---
    let items: Vec<ListItem> = match panel {
        PanelContent::Blank => Vec::new(),
        PanelContent::NoActiveAlerts => vec![ListItem::new(NO_ACTIVE_ALERTS).style(theme.fg(Color::DarkGray))],
        PanelContent::Alerts(entries) => entries
            .iter()
            .map(|entry| ListItem::new(format!("● {}", entry.text)).style(theme.alert(entry.kind)))
            .collect(),
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Clinical alerts "));
    f.render_widget(list, area);
}

fn draw_status(f: &mut Frame, area: Rect, connection: ConnectionStatus, theme: Theme) {
    // ---
    let status = match connection {
        ConnectionStatus::Idle => Span::raw(""),
        ConnectionStatus::Connecting => Span::styled("[connecting]", theme.fg(Color::DarkGray)),
        ConnectionStatus::Live => Span::styled("[live]", theme.fg(Color::Green)),
        ConnectionStatus::Disconnected => Span::styled(
            "[DISCONNECTED]",
            theme.fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    f.render_widget(Paragraph::new(Line::from(status)), area);
}
