pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Section};
use components::hints::{KeyHint, hints_to_spans};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let theme = Theme::default();
    let area = frame.area();

    // Main layout: info bar, optional connection banner, tabs, content,
    // bottom bar.
    let mut constraints = vec![
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(1),
    ];
    if !state.connection.ok {
        constraints.insert(1, Constraint::Length(1));
    }
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut row = 0;
    render_info_bar(frame, layout[row], state, &theme);
    row += 1;
    if !state.connection.ok {
        render_connection_banner(frame, layout[row], state, &theme);
        row += 1;
    }
    components::tabs::render_tabs(frame, layout[row], state.section, &theme);
    row += 1;

    match state.section {
        Section::Service => screens::service::render(frame, layout[row], state),
        Section::Expenses => screens::expenses::render(frame, layout[row], state),
        Section::Config => screens::config::render(frame, layout[row], state),
    }
    row += 1;

    render_bottom_bar(frame, layout[row], state, &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let status = if state.connection.ok { "OK" } else { "ERR" };
    let status_style = if state.connection.ok {
        Style::default().fg(theme.positive)
    } else {
        Style::default().fg(theme.error)
    };

    let line = Line::from(vec![
        Span::styled(
            "Officina",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.user_id)),
        Span::styled("Backend", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled(status, status_style),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// The one global, persistent error surface: shown on every screen until the
/// client comes up, while all mutating controls stay disabled.
fn render_connection_banner(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let detail = state
        .connection
        .detail
        .as_deref()
        .unwrap_or("backend connection is not initialized");
    let line = Line::from(Span::styled(
        format!(" Not connected: {detail}. Entry and configuration controls are disabled."),
        Style::default().fg(theme.error),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut hints = vec![KeyHint::new("F1/F2/F3", "tabs")];
    match state.section {
        Section::Service | Section::Expenses => {
            hints.push(KeyHint::new("Tab", "next field"));
            hints.push(KeyHint::new("↑/↓", "pick option"));
            hints.push(KeyHint::new("Enter", "submit"));
        }
        Section::Config => {
            hints.push(KeyHint::new("Tab", "switch list"));
            hints.push(KeyHint::new("Enter", "add"));
            hints.push(KeyHint::new("↑/↓", "select"));
            hints.push(KeyHint::new("Del", "delete"));
        }
    }
    hints.push(KeyHint::new("Ctrl+R", "refresh"));
    hints.push(KeyHint::new("Ctrl+C", "quit"));

    let bar = Paragraph::new(Line::from(hints_to_spans(&hints, theme)));
    frame.render_widget(bar, area);
}
