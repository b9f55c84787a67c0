use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use store::OptionsState;

use crate::{
    app::{AppState, ConfigPane, ConfigPaneState, MessageLevel},
    ui::theme::Theme,
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    if state.service_types.loading && state.expense_categories.loading {
        let content = Paragraph::new(Line::from(Span::styled(
            "Loading configuration lists...",
            Style::default().fg(theme.text_muted),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(content, area);
        return;
    }

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_pane(
        frame,
        cols[0],
        "Service Types",
        &state.service_types,
        &state.config_tab.service_types,
        state.config_tab.focus == ConfigPane::ServiceTypes,
        &theme,
    );
    render_pane(
        frame,
        cols[1],
        "Expense Categories",
        &state.expense_categories,
        &state.config_tab.expense_categories,
        state.config_tab.focus == ConfigPane::ExpenseCategories,
        &theme,
    );
}

fn render_pane(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    options: &OptionsState,
    pane: &ConfigPaneState,
    focused: bool,
    theme: &Theme,
) {
    let border_style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.border)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title.to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Input
            Constraint::Length(1), // Message
            Constraint::Min(0),    // Items
        ])
        .split(inner);

    let cursor = if focused { "▏" } else { "" };
    let input = Line::from(vec![
        Span::styled("New name: ", Style::default().fg(theme.text_muted)),
        Span::styled(
            format!("{}{cursor}", pane.input),
            Style::default().fg(theme.text),
        ),
    ]);
    frame.render_widget(Paragraph::new(input), layout[0]);

    // A local message takes the slot; otherwise a fetch error shows here so
    // the stale list below stays visible.
    if let Some(message) = &pane.message {
        let style = match message.level {
            MessageLevel::Success => Style::default().fg(theme.positive),
            MessageLevel::Error => Style::default().fg(theme.error),
        };
        let line = Line::from(Span::styled(message.text.clone(), style));
        frame.render_widget(Paragraph::new(line), layout[1]);
    } else if let Some(err) = &options.error {
        let line = Line::from(Span::styled(
            format!("Error loading list: {err}"),
            Style::default().fg(theme.error),
        ));
        frame.render_widget(Paragraph::new(line), layout[1]);
    }

    if options.loading {
        let content = Paragraph::new(Line::from(Span::styled(
            "Loading...",
            Style::default().fg(theme.text_muted),
        )));
        frame.render_widget(content, layout[2]);
        return;
    }
    if options.items.is_empty() {
        let content = Paragraph::new(Line::from(Span::styled(
            "No items defined. Add one above!",
            Style::default().fg(theme.text_muted),
        )));
        frame.render_widget(content, layout[2]);
        return;
    }

    let items = options
        .items
        .iter()
        .map(|option| ListItem::new(Line::from(option.name.clone())))
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    if focused {
        list_state.select(Some(pane.selected.min(options.items.len() - 1)));
    }

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");
    frame.render_stateful_widget(list, layout[2], &mut list_state);
}
