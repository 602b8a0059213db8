//! Header Component
//!
//! Displays the API, the listed resource and the page being shown.

use crate::app::App;
use crate::VERSION;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" tadmin v{} ", VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Row 1: API
    let api_line = Line::from(vec![
        Span::styled(" API: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.api_url.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    f.render_widget(Paragraph::new(api_line), rows[0]);

    // Row 2: Resource and page
    let resource = app.current_resource();
    let loading = if app.page_state.is_pending {
        Span::styled("  loading", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    };
    let resource_line = Line::from(vec![
        Span::styled(" Resource: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            resource.display_name.as_str(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Page: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}", app.page),
            Style::default().fg(Color::White),
        ),
        Span::styled("  Rows: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}", app.page_state.items.len()),
            Style::default().fg(Color::White),
        ),
        loading,
    ]);
    f.render_widget(Paragraph::new(resource_line), rows[1]);

    // Row 3: Help hint
    let actions = if app.readonly {
        " ?:help  ::cmd  Enter:view  n/p:page  q:quit"
    } else {
        " ?:help  ::cmd  Enter:actions  a:add  e:edit  d:delete  n/p:page  q:quit"
    };
    let help_line = Line::from(vec![
        Span::styled(actions, Style::default().fg(Color::DarkGray)),
        if app.readonly {
            Span::styled(
                "  [READ-ONLY]",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("")
        },
    ]);
    f.render_widget(Paragraph::new(help_line), rows[2]);
}
