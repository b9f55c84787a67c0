use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::{
    app::{AppState, ExpenseField, MessageLevel, StatusMessage},
    ui::theme::Theme,
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Entry form
            Constraint::Length(1), // Message
            Constraint::Min(0),    // History
        ])
        .split(area);

    render_form(frame, layout[0], state, &theme);
    render_message(frame, layout[1], state.expense.message.as_ref(), &theme);
    render_history(frame, layout[2], state, &theme);
}

fn field_line<'a>(label: &str, value: Span<'a>, focused: bool, theme: &Theme) -> Line<'a> {
    let marker = if focused { "» " } else { "  " };
    let label_style = if focused {
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_muted)
    };
    Line::from(vec![
        Span::styled(marker.to_string(), Style::default().fg(theme.accent)),
        Span::styled(format!("{label:<18}"), label_style),
        value,
    ])
}

fn text_value<'a>(raw: &'a str, placeholder: &'a str, theme: &Theme) -> Span<'a> {
    if raw.is_empty() {
        Span::styled(placeholder, Style::default().fg(theme.text_muted))
    } else {
        Span::styled(raw, Style::default().fg(theme.text))
    }
}

fn render_form(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let draft = &state.expense.draft;
    let focus = state.expense.focus;
    let categories = &state.expense_categories;

    let category_value = if categories.items.is_empty() {
        let placeholder = if categories.loading {
            "Loading categories..."
        } else {
            "No categories defined (check Configuration tab)"
        };
        Span::styled(placeholder, Style::default().fg(theme.text_muted))
    } else {
        let name = if draft.category.is_empty() {
            "-"
        } else {
            draft.category.as_str()
        };
        if focus == ExpenseField::Category {
            Span::styled(format!("◂ {name} ▸"), Style::default().fg(theme.text))
        } else {
            Span::styled(name.to_string(), Style::default().fg(theme.text))
        }
    };

    let lines = vec![
        field_line(
            "Date of Expense",
            text_value(&draft.date_of_expense, "YYYY-MM-DD", theme),
            focus == ExpenseField::Date,
            theme,
        ),
        field_line(
            "Category",
            category_value,
            focus == ExpenseField::Category,
            theme,
        ),
        field_line(
            "Description",
            text_value(&draft.description, "-", theme),
            focus == ExpenseField::Description,
            theme,
        ),
        field_line(
            "Amount",
            text_value(&draft.amount, "0.00", theme),
            focus == ExpenseField::Amount,
            theme,
        ),
        submit_hint(state, theme),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title("Record New Expense");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn submit_hint(state: &AppState, theme: &Theme) -> Line<'static> {
    let span = if !state.connection.ok {
        Span::styled(
            "Submit disabled: not connected.",
            Style::default().fg(theme.error),
        )
    } else if state.expense_categories.loading {
        Span::styled("Loading categories...", Style::default().fg(theme.text_muted))
    } else if state.expense_categories.items.is_empty() {
        Span::styled(
            "Add expense categories in the Configuration tab to enable submit.",
            Style::default().fg(theme.text_muted),
        )
    } else {
        Span::styled(
            "Enter submits the expense record.",
            Style::default().fg(theme.text_muted),
        )
    };
    Line::from(vec![Span::raw("  "), span])
}

fn render_message(
    frame: &mut Frame<'_>,
    area: Rect,
    message: Option<&StatusMessage>,
    theme: &Theme,
) {
    let Some(message) = message else {
        return;
    };
    let style = match message.level {
        MessageLevel::Success => Style::default().fg(theme.positive),
        MessageLevel::Error => Style::default().fg(theme.error),
    };
    let line = Line::from(Span::styled(format!(" {}", message.text), style));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_history(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let history = &state.expense.history;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(format!("Expense History ({})", history.rows.len()));

    if let Some(err) = &history.error {
        let content = Paragraph::new(Line::from(Span::styled(
            format!("Error loading expenses: {err}"),
            Style::default().fg(theme.error),
        )))
        .block(block);
        frame.render_widget(content, area);
        return;
    }
    if history.loading {
        let content = Paragraph::new(Line::from(Span::styled(
            "Loading expense history...",
            Style::default().fg(theme.text_muted),
        )))
        .block(block);
        frame.render_widget(content, area);
        return;
    }
    if history.rows.is_empty() {
        let content = Paragraph::new(Line::from(Span::styled(
            "No expense records found. Start by logging a new entry!",
            Style::default().fg(theme.text_muted),
        )))
        .block(block);
        frame.render_widget(content, area);
        return;
    }

    let items = history
        .rows
        .iter()
        .map(|record| {
            let logged = record
                .created_at
                .with_timezone(&state.timezone)
                .format("%d %b %H:%M")
                .to_string();
            let head = format!(
                "{}  {:<18} {:>10.2}  logged {logged}  by {}",
                record.date_of_expense,
                record.category,
                record.amount,
                super::short_user(&record.recorded_by),
            );
            let mut lines = vec![Line::from(head)];
            if let Some(description) = record
                .description
                .as_deref()
                .filter(|description| !description.is_empty())
            {
                lines.push(Line::from(Span::styled(
                    format!("    {description}"),
                    Style::default().fg(theme.text_muted),
                )));
            }
            ListItem::new(lines)
        })
        .collect::<Vec<_>>();

    frame.render_widget(List::new(items).block(block), area);
}
