// Input tab rendering.
// The file trigger, the path entry field when focused, and crawl settings.

use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::state::FileInputFocus;

pub fn draw_input(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Trigger and chosen file
            Constraint::Length(3), // Path entry
            Constraint::Min(1),    // Settings
        ])
        .split(area);

    app.trigger_area = chunks[0];
    let input = &app.file_input;
    let trigger_style = if input.focus() == FileInputFocus::Trigger {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let chosen = if input.display().is_empty() {
        Span::styled("No file chosen", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(input.display(), Style::default().fg(Color::White))
    };

    let trigger = Paragraph::new(Line::from(vec![
        Span::styled(" Choose CSV… ", trigger_style),
        Span::raw("  "),
        chosen,
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Input file "));
    frame.render_widget(trigger, chunks[0]);

    if input.picker_focused() {
        let entry = Paragraph::new(Line::from(vec![
            Span::styled("Path: ", Style::default().fg(Color::DarkGray)),
            Span::raw(input.buffer()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Enter to confirm, Esc to cancel "),
        );
        frame.render_widget(entry, chunks[1]);
    }

    let settings = &app.settings;
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));
    let mut lines = vec![
        Line::from(vec![label("Model        "), Span::raw(settings.agent.model.clone())]),
        Line::from(vec![
            label("Output dir   "),
            Span::raw(settings.output_dir.display().to_string()),
        ]),
        Line::from(vec![
            label("Max steps    "),
            Span::raw(settings.agent.max_steps.to_string()),
        ]),
        Line::from(""),
    ];
    lines.push(if app.running {
        Line::from(Span::styled(
            "⏳ Crawl running, see the Console tab",
            Style::default().fg(Color::Yellow),
        ))
    } else if input.value().is_some() {
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("s", Style::default().fg(Color::Yellow)),
            Span::raw(" to start the crawl"),
        ])
    } else {
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" to choose a CSV with a start_url column"),
        ])
    });

    let info = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Crawl "))
        .wrap(Wrap { trim: false });
    frame.render_widget(info, chunks[2]);
}
