// Console tab rendering.
// Crawl output with level icons, timestamps and a tail-follow indicator.

use chrono::Local;
use ratatui::{prelude::*, widgets::*};

use crate::state::{ConsoleLevel, ConsoleOutput};

/// Draw the console. Updates the console's viewport to the drawn height.
pub fn draw_console(frame: &mut Frame, console: &mut ConsoleOutput, area: Rect) {
    console.set_viewport(area.height.saturating_sub(2) as usize);

    if console.is_empty() {
        let block = Block::default().borders(Borders::ALL).title(" Console ");
        let text = Paragraph::new("No messages yet. Start a crawl with s")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let total = console.len();
    let first = console.offset() + 1;
    let last = (console.offset() + area.height.saturating_sub(2) as usize).min(total);
    let follow = if console.auto_scroll() { " ⇣" } else { "" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Console [{}-{}/{}]{} ", first, last, total, follow));

    let lines: Vec<Line> = console
        .messages()
        .iter()
        .map(|msg| {
            let (icon, color) = match msg.level {
                ConsoleLevel::Error => ("❌", Color::Red),
                ConsoleLevel::Warn => ("⚠️", Color::Yellow),
                ConsoleLevel::Info => ("ℹ️", Color::Cyan),
            };
            let time = msg.timestamp.with_timezone(&Local).format("%H:%M:%S");

            Line::from(vec![
                Span::raw(format!("{} ", icon)),
                Span::styled(time.to_string(), Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(msg.message.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    let text = Paragraph::new(lines)
        .block(block)
        .scroll((console.offset().min(u16::MAX as usize) as u16, 0));
    frame.render_widget(text, area);
}
