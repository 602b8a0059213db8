//! Form modal
//!
//! Renders the open create/edit form: one line per field, its error under
//! it, and the submit hint at the bottom.

use super::centered_rect;
use crate::app::App;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let Some(form) = &app.form else {
        return;
    };

    let popup_area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} ", form.title()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let mut lines: Vec<Line> = vec![Line::from("")];

    for (idx, field) in form.fields.iter().enumerate() {
        let focused = idx == form.focus;
        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let cursor = if focused { "_" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(if focused { " ▸ " } else { "   " }, label_style),
            Span::styled(format!("{:<20}", field.label()), label_style),
            Span::styled(
                format!("{}{}", field.display_value(), cursor),
                Style::default().fg(Color::White),
            ),
        ]));

        if let Some(error) = &field.error {
            lines.push(Line::from(Span::styled(
                format!("{:>23}{}", "", error),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines.push(Line::from(""));

    let hint = if form.submitting {
        Span::styled("   Saving...", Style::default().fg(Color::Yellow))
    } else if !form.can_submit() {
        Span::styled(
            "   No changes | Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(
            "   Enter: save | Tab: next field | Space/←→: toggle | Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )
    };
    lines.push(Line::from(hint));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup_area);
}
