//! Command Box
//!
//! `:` input with ghost-text completion and a described suggestion list.

use crate::app::App;
use crate::resource::{get_resource, ResourceKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

const MAX_SUGGESTIONS: usize = 8;

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(13)])
        .split(f.area());

    let command_area = chunks[1];
    f.render_widget(Clear, command_area);

    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(command_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Command ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let mut spans = vec![
        Span::styled(":", Style::default().fg(Color::Cyan)),
        Span::styled(app.command_text.as_str(), Style::default().fg(Color::White)),
    ];
    if let Some(rest) = app
        .command_preview
        .as_deref()
        .and_then(|preview| preview.strip_prefix(app.command_text.as_str()))
    {
        spans.push(Span::styled(rest, Style::default().fg(Color::DarkGray)));
    }

    let input_para = Paragraph::new(Line::from(spans)).block(input_block);
    f.render_widget(input_para, inner_chunks[0]);

    let suggestions_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Suggestions (↑/↓ to select, Tab to complete) ",
            Style::default().fg(Color::DarkGray),
        ));

    let suggestions: Vec<ListItem> = app
        .command_suggestions
        .iter()
        .enumerate()
        .take(MAX_SUGGESTIONS)
        .map(|(i, cmd)| {
            let style = if i == app.command_suggestion_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {:<24}", cmd), style),
                Span::styled(describe(cmd), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    f.render_widget(List::new(suggestions).block(suggestions_block), inner_chunks[1]);
}

fn describe(command: &str) -> String {
    if let Some(kind) = ResourceKind::from_key(command) {
        return format!("List {}", get_resource(kind).display_name);
    }
    match command {
        "create" => "Add a record of the current resource".to_string(),
        "refresh" => "Reload the current page".to_string(),
        "notifications" => "Show notification history".to_string(),
        "notifications clear" => "Forget all notifications".to_string(),
        "quit" => "Exit tadmin".to_string(),
        _ => String::new(),
    }
}
