//! Notifications Panel UI
//!
//! Renders the mutation history as an overlay table.

use super::centered_rect;
use crate::app::App;
use crate::notification::NotificationStatus;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

/// Render the notifications history panel as an overlay
pub fn render(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(80, 70, f.area());
    f.render_widget(Clear, popup_area);

    let pending = app.notification_manager.pending_count();
    let title = if pending > 0 {
        format!(" Notifications [{} pending] ", pending)
    } else {
        " Notifications ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(popup_area);
    f.render_widget(block, popup_area);

    if !app.notification_manager.has_notifications() {
        let msg = Paragraph::new("No notifications yet")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(msg, inner_area);
        return;
    }

    let header_cells = [" ", " RESULT", " RESOURCE", " DETAIL", " TOOK", " WHEN"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells).height(1);

    let rows = app.notification_manager.notifications.iter().map(|notif| {
        let status_color = match &notif.status {
            NotificationStatus::Pending => Color::Yellow,
            NotificationStatus::Success => Color::Green,
            NotificationStatus::Error(_) => Color::Red,
        };
        let detail = notif
            .description()
            .unwrap_or_else(|| notif.operation.present_participle().to_string());

        Row::new(vec![
            Cell::from(format!(" {}", notif.status.icon())).style(Style::default().fg(status_color)),
            Cell::from(format!(" {}", notif.title())).style(Style::default().fg(status_color)),
            Cell::from(format!(" {}", notif.kind)),
            Cell::from(format!(" {}", truncate(&detail, 60))),
            Cell::from(format!(" {}", notif.duration_display())),
            Cell::from(format!(" {}", format_time_ago(notif.created_at.elapsed()))),
        ])
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Length(24),
        Constraint::Length(16),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    state.select(Some(app.notifications_selected));
    f.render_stateful_widget(table, inner_area, &mut state);

    if popup_area.height < 3 || popup_area.width < 3 {
        return;
    }
    let help_area = Rect::new(
        popup_area.x + 1,
        popup_area.y + popup_area.height - 1,
        popup_area.width - 2,
        1,
    );
    let help = Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(": navigate  "),
        Span::styled("c", Style::default().fg(Color::Yellow)),
        Span::raw(": clear  "),
        Span::styled("q/Esc", Style::default().fg(Color::Yellow)),
        Span::raw(": close"),
    ]);
    f.render_widget(Paragraph::new(help).alignment(Alignment::Center), help_area);
}

fn format_time_ago(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_time_ago() {
        assert_eq!(format_time_ago(Duration::from_secs(5)), "5s ago");
        assert_eq!(format_time_ago(Duration::from_secs(125)), "2m ago");
        assert_eq!(format_time_ago(Duration::from_secs(7200)), "2h ago");
    }
}
