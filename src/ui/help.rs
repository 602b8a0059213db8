//! Help Overlay
//!
//! Shows keyboard shortcuts.

use super::centered_rect;
use crate::app::App;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k, ↑/↓", "Move up/down"),
            ("Home, End/G", "First/last row"),
            ("1-9", "Jump to row"),
            ("n, ], →", "Next page"),
            ("p, [, ←", "Previous page"),
            ("R", "Refresh current resource"),
        ],
    ),
    (
        "Records",
        &[
            ("Enter", "Row actions"),
            ("a, c", "Add a record"),
            ("e", "Edit selected record"),
            ("d", "Delete selected record"),
        ],
    ),
    (
        "Forms",
        &[
            ("Tab/Shift+Tab", "Next/previous field"),
            ("Space, ←/→", "Toggle a checkbox or answer"),
            ("Enter, Ctrl+s", "Save"),
            ("Esc", "Cancel"),
        ],
    ),
    (
        "Other",
        &[
            (":", "Command mode (resource name, create, refresh)"),
            ("N", "Notification history"),
            ("?/Esc", "Close help"),
            ("q", "Quit"),
        ],
    ),
];

pub fn render(f: &mut Frame, _app: &App) {
    let popup_area = centered_rect(70, 80, f.area());
    f.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(
            *title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (key, description) in keys.iter() {
            help_text.push(Line::from(vec![
                Span::styled(format!("  {:<16}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*description),
            ]));
        }
        help_text.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left);

    f.render_widget(paragraph, popup_area);
}
