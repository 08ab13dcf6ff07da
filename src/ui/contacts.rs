// Contacts tab rendering.
// Table of found contacts with a detail pane for the selected row.

use ratatui::{prelude::*, widgets::*};

use crate::contacts::{ContactRow, UNKNOWN};
use crate::state::{ContactsView, LoadingState};

/// Render a loading indicator.
fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an error message.
fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red));
    frame.render_widget(text, area);
}

/// Render an empty state message.
fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

pub fn draw_contacts(frame: &mut Frame, view: &mut ContactsView, area: Rect) {
    let title = match view.usage {
        Some(usage) => format!(
            " Contacts ({}) · tokens {} in / {} out ",
            view.rows().len(),
            usage.input,
            usage.output
        ),
        None => format!(" Contacts ({}) ", view.rows().len()),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.rows().is_empty() {
        match &view.data {
            LoadingState::Idle => {
                render_empty(frame, inner, "No contacts yet. Choose an input file and press s")
            }
            LoadingState::Loading => render_loading(frame, inner, "Searching for contacts"),
            LoadingState::Error(e) => render_error(frame, inner, e),
            LoadingState::Loaded(_) => render_empty(frame, inner, "No contacts found"),
        }
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Table
            Constraint::Length(7), // Details
        ])
        .split(inner);

    let header = Row::new(["Name", "Party", "Position", "Email", "Phone"])
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .bottom_margin(1);

    let rows: Vec<Row> = view
        .rows()
        .iter()
        .map(|row| {
            Row::new([
                Cell::from(row.name.clone()),
                value_cell(&row.political_party),
                value_cell(&row.position),
                value_cell(&row.email),
                value_cell(&row.phone),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(14),
        Constraint::Percentage(22),
        Constraint::Percentage(26),
        Constraint::Percentage(16),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(table, chunks[0], &mut view.table_state);

    if let Some(row) = view.selected_row() {
        draw_details(frame, row, chunks[1]);
    }
}

fn value_cell(value: &Option<String>) -> Cell<'static> {
    match value.as_deref() {
        None | Some(UNKNOWN) | Some("") => {
            Cell::from(UNKNOWN).style(Style::default().fg(Color::DarkGray))
        }
        Some(v) => Cell::from(v.to_string()),
    }
}

fn draw_details(frame: &mut Frame, row: &ContactRow, area: Rect) {
    let field = |label: &'static str, value: &Option<String>| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::DarkGray)),
            Span::raw(value.clone().unwrap_or_else(|| UNKNOWN.to_string())),
        ])
    };

    let lines = vec![
        field("Website     ", &row.contact_url),
        field("Address     ", &row.address),
        field("Info        ", &row.additional_info),
        field("Start URL   ", &row.start_url),
        field("Updated     ", &row.last_updated),
    ];

    let details = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(format!(" {} ", row.name)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(details, area);
}
