// Tab bar rendering with badge support for Console tab.
// Handles visual indication of active tab and unread error count.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Tab};

/// Draw the tab bar at the top of the screen.
pub fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tab_titles: Vec<Line> = app
        .tabs
        .panels()
        .iter()
        .enumerate()
        .map(|(index, tab)| {
            let badge = *tab == Tab::Console && app.console_unread > 0;
            let title = if badge {
                format!("{} {} ({})", index + 1, tab.title(), app.console_unread)
            } else {
                format!("{} {}", index + 1, tab.title())
            };

            let style = if app.tabs.is_selector_active(index) {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else if badge {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(Span::styled(title, style))
        })
        .collect();

    let title = if app.running {
        " contact-scout ⏳ "
    } else {
        " contact-scout "
    };

    let tabs_widget = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title)
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(app.tabs.active_index())
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" │ "));

    frame.render_widget(tabs_widget, area);
}
