// UI module for rendering the TUI.
// Contains the tab bar, the three tab views, status bar and help overlay.

mod console;
mod contacts;
mod input;
mod tabs;

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Tab bar
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);

    match app.tabs.active() {
        Tab::Input => input::draw_input(frame, app, chunks[1]),
        Tab::Console => console::draw_console(frame, &mut app.console, chunks[1]),
        Tab::Contacts => contacts::draw_contacts(frame, &mut app.contacts, chunks[1]),
    }

    draw_status_bar(frame, app, chunks[2]);

    // Help overlay (rendered last, on top of everything)
    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::raw(key),
        Span::styled(action, Style::default().fg(Color::DarkGray)),
    ]
}

/// Draw the status bar with keybinding hints for the active tab.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut hints: Vec<Span> = Vec::new();

    if app.file_input.picker_focused() {
        hints.extend(hint(" ↵ ", "Confirm"));
        hints.extend(hint("  Esc ", "Cancel"));
    } else {
        match app.tabs.active() {
            Tab::Input => hints.extend(hint(" ↵/Space/Click ", "Choose file")),
            Tab::Console => {
                hints.extend(hint(" ↑↓ ", "Scroll"));
                hints.extend(hint("  PgUp/Dn ", "Page"));
                hints.extend(hint("  Home/End ", "Jump"));
            }
            Tab::Contacts => hints.extend(hint(" ↑↓ ", "Select")),
        }
        hints.extend(hint("  s ", "Start"));
        hints.extend(hint("  Tab ", "Switch"));
        hints.extend(hint("  ? ", "Help"));
        hints.extend(hint("  q ", "Quit"));
    }

    if app.running {
        hints.push(Span::styled(
            "  ⏳ crawling",
            Style::default().fg(Color::Yellow),
        ));
    }

    let status = Paragraph::new(Line::from(hints));
    frame.render_widget(status, area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Create a centered popup
    let popup_width = 52;
    let popup_height = 17;
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(
        popup_x,
        popup_y,
        popup_width.min(area.width),
        popup_height.min(area.height),
    );

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let key_line = |key: &'static str, action: &'static str| {
        Line::from(vec![
            Span::styled(key, Style::default().fg(Color::Cyan)),
            Span::raw(action),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        key_line("  Tab/Shift-Tab ", "Switch tabs"),
        key_line("  1-3           ", "Jump to tab"),
        key_line("  Enter/Space   ", "Choose input file (or click it)"),
        key_line("  s             ", "Start crawl"),
        key_line("  ↑/↓ or j/k    ", "Scroll console / select contact"),
        key_line("  PgUp/PgDn     ", "Page scroll (Console)"),
        key_line("  Home/End g/G  ", "Jump to start/end (Console)"),
        key_line("  ?             ", "Show/hide this help"),
        key_line("  q             ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_paragraph, popup_area);
}
