//! Terminal User Interface rendering module
//!
//! This module handles all UI rendering for tadmin using the ratatui framework.
//! One resource kind is listed at a time, one page at a time, with modals
//! drawn on top for row actions, forms and confirmations.
//!
//! # Architecture
//!
//! - [`splash`] - Startup splash screen
//! - `header` - Header bar with API, resource and page info
//! - `help` - Help overlay showing keybindings
//! - `dialog` - Actions menu, delete confirmation and warnings
//! - `form` - Create/edit form modal
//! - `command_box` - Command mode input (`:` key)
//! - `notifications` - Notification history panel
//!
//! # Placeholder rows
//!
//! While the next page is loading the table keeps showing the previous
//! page's rows, dimmed, and the "next" control is disabled.

mod command_box;
mod dialog;
mod form;
mod header;
mod help;
mod notifications;
pub mod splash;

use crate::app::{App, Mode};
use crate::notification::NotificationStatus;
use crate::resource::display::{display_row, extract_json_value};
use crate::resource::registry::{get_color_for_value, ColumnDef};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header
            Constraint::Min(1),    // Table
            Constraint::Length(1), // Pager
            Constraint::Length(1), // Status line
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);
    render_table(f, app, chunks[1]);
    render_pager(f, app, chunks[2]);
    render_status(f, app, chunks[3]);

    // Overlays
    match app.mode {
        Mode::Help => help::render(f, app),
        Mode::Actions | Mode::ConfirmDelete | Mode::Warning => dialog::render(f, app),
        Mode::Form => form::render(f, app),
        Mode::Command => command_box::render(f, app),
        Mode::Notifications => notifications::render(f, app),
        Mode::Normal => {}
    }
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let resource = app.current_resource();
    let state = &app.page_state;

    let title = if state.is_placeholder {
        format!(" {}[{}] loading page {}… ", resource.display_name, state.items.len(), state.page)
    } else {
        format!(" {}[{}] ", resource.display_name, state.items.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if state.items.is_empty() {
        let message = if state.is_pending {
            "Loading..."
        } else if app.error_message.is_some() {
            "Could not load this page"
        } else {
            "Nothing here yet. Press 'a' to add one."
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, inner_area);
        return;
    }

    let header_cells: Vec<Cell> = resource
        .columns
        .iter()
        .map(|col| {
            Cell::from(format!(" {}", col.header)).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = state
        .items
        .iter()
        .map(|record| {
            let row = display_row(record);
            let cells = resource.columns.iter().map(|col| {
                let value = extract_json_value(&row, &col.json_path);
                let style = if state.is_placeholder {
                    Style::default().fg(Color::DarkGray)
                } else {
                    get_cell_style(&value, col)
                };
                Cell::from(format!(" {}", truncate_string(&value, 38))).style(style)
            });
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = resource
        .columns
        .iter()
        .map(|col| Constraint::Percentage(col.width))
        .collect();

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut table_state = TableState::default();
    if !state.is_placeholder {
        table_state.select(Some(app.selected));
    }

    f.render_stateful_widget(table, inner_area, &mut table_state);
}

/// Get cell style based on value and column definition
fn get_cell_style(value: &str, col: &ColumnDef) -> Style {
    if let Some(ref color_map_name) = col.color_map {
        if let Some([r, g, b]) = get_color_for_value(color_map_name, value) {
            return Style::default().fg(Color::Rgb(r, g, b));
        }
    }
    Style::default()
}

/// Truncate string for display (Unicode-safe)
fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

fn pager_style(enabled: bool) -> Style {
    if enabled {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// "< Previous  Page N  Next >" with disabled controls dimmed
fn render_pager(f: &mut Frame, app: &App, area: Rect) {
    let pager = Line::from(vec![
        Span::styled("◀ [p] Previous", pager_style(app.can_go_previous())),
        Span::raw("   "),
        Span::styled(
            format!("Page {}", app.page),
            Style::default().fg(Color::White),
        ),
        Span::raw("   "),
        Span::styled("Next [n] ▶", pager_style(app.has_next_page())),
    ]);
    f.render_widget(Paragraph::new(pager).alignment(Alignment::Center), area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let toast = app.notification_manager.current_toast();
    let toast_text = toast.map(|notif| notif.toast_message(app.notification_manager.detail_level));

    let notification_indicator = {
        let pending = app.notification_manager.pending_count();
        let total = app.notification_manager.notifications.len();
        if pending > 0 {
            format!(" [↻{}]", pending)
        } else if total > 0 {
            " [N]".to_string()
        } else {
            String::new()
        }
    };

    let (status_text, style) = if let Some(toast_text) = toast_text {
        let style = match toast.map(|notif| &notif.status) {
            Some(NotificationStatus::Success) => Style::default().fg(Color::Green),
            Some(NotificationStatus::Error(_)) => Style::default().fg(Color::Red),
            _ => Style::default().fg(Color::Yellow),
        };
        (toast_text, style)
    } else if let Some(err) = &app.error_message {
        (
            format!("Error: {}", err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "?: help | :: command | Enter: actions | a: add | R: refresh".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };

    let line = Line::from(vec![
        Span::styled(
            format!("<{}>", app.kind.key()),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(status_text, style),
        Span::styled(notification_indicator, Style::default().fg(Color::DarkGray)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}

/// Rectangle centered in `r`, sized in percent
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_is_char_safe() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("ééééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_centered_rect_fits_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(50, 20, outer);
        assert_eq!(inner.width, 50);
        assert!(inner.x >= 25 && inner.y >= 20);
    }
}
