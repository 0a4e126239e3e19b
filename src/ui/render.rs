use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::types::note::key_name;

use super::app::MonitorApp;

/// Lamp colors per motor, wrapping past eight.
const MOTOR_COLORS: [Color; 8] = [
    Color::Red,
    Color::LightRed,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::LightMagenta,
    Color::Gray,
];

fn motor_color(index: usize) -> Color {
    MOTOR_COLORS[index % MOTOR_COLORS.len()]
}

/// Render the TUI
pub fn render(frame: &mut Frame, app: &MonitorApp) {
    if app.ready {
        render_monitor(frame, app);
    } else {
        render_waiting(frame, app);
    }
}

/// Render the holding screen shown until the controller says hello
fn render_waiting(frame: &mut Frame, app: &MonitorApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Status
            Constraint::Length(4), // Help
        ])
        .split(frame.size());

    render_title(frame, chunks[0]);

    let status = Paragraph::new(vec![
        Line::from(""),
        Line::from("Waiting for controller..."),
        Line::from(format!("{} motors armed", app.motors.len())),
    ])
    .style(Style::default().fg(Color::Yellow))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[1]);

    render_help(frame, chunks[2]);
}

/// Render the live monitor screen
fn render_monitor(frame: &mut Frame, app: &MonitorApp) {
    let table_height = app.motors.len() as u16 + 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Title
            Constraint::Length(3),            // Keyboard strip
            Constraint::Length(table_height), // Motor table
            Constraint::Min(0),               // Note history
            Constraint::Length(4),            // Help
        ])
        .split(frame.size());

    render_title(frame, chunks[0]);
    render_keyboard(frame, chunks[1], app);
    render_motors(frame, chunks[2], app);
    render_history(frame, chunks[3], app);
    render_help(frame, chunks[4]);
}

/// Render title bar
fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new("Robopiano - Motor Bus Monitor")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(title, area);
}

/// One cell per key across the keyboard, lit in its motor's color while held
fn render_keyboard(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let cells: Vec<Span> = (0..app.keys)
        .map(|code| match app.motor_for_key(code) {
            Some(motor) => Span::styled("█", Style::default().fg(motor_color(motor))),
            None => Span::styled("·", Style::default().fg(Color::DarkGray)),
        })
        .collect();

    let strip = Paragraph::new(Line::from(cells))
        .alignment(Alignment::Center)
        .block(Block::default().title("Keyboard").borders(Borders::ALL));
    frame.render_widget(strip, area);
}

/// Render one row per motor with its note, step interval and step count
fn render_motors(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let rows: Vec<ListItem> = app
        .motors
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let note_label = match view.note {
                Some(code) => key_name(code),
                None => "--".to_string(),
            };
            let style = if view.note.is_some() {
                Style::default()
                    .fg(motor_color(i))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(format!(
                " M{:<2} {:<4} {:>7} µs {:>9} steps",
                i, note_label, view.interval_us, view.pulses
            ))
            .style(style)
        })
        .collect();

    let list = List::new(rows).block(Block::default().title("Motors").borders(Borders::ALL));
    frame.render_widget(list, area);
}

/// Scrolling note roll, one row per monitor tick, newest on top
fn render_history(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let rows: Vec<ListItem> = app
        .history
        .iter()
        .rev()
        .map(|row| {
            let cells: Vec<Span> = row
                .iter()
                .enumerate()
                .map(|(i, note)| match note {
                    Some(code) => Span::styled(
                        format!("{:<6}", key_name(*code)),
                        Style::default().fg(motor_color(i)),
                    ),
                    None => Span::styled("  .   ", Style::default().fg(Color::DarkGray)),
                })
                .collect();
            ListItem::new(Line::from(cells))
        })
        .collect();

    let list = List::new(rows).block(Block::default().title("History").borders(Borders::ALL));
    frame.render_widget(list, area);
}

/// Render help text
fn render_help(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from("Controls:"),
        Line::from("  Q/Esc: Quit"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(paragraph, area);
}
