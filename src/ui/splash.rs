//! Splash Screen
//!
//! Loading screen shown while tadmin reads its config, signs in and fetches
//! the first page.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

/// Startup steps: config, client, sign-in, first page
const TOTAL_STEPS: usize = 4;

const LOGO: [&str; 5] = [
    r"  _            _           _       ",
    r" | |_ __ _  __| |_ __ ___ (_)_ __  ",
    r" | __/ _` |/ _` | '_ ` _ \| | '_ \ ",
    r" | || (_| | (_| | | | | | | | | | |",
    r"  \__\__,_|\__,_|_| |_| |_|_|_| |_|",
];

/// Splash screen state
#[derive(Debug)]
pub struct SplashState {
    message: String,
    completed_steps: usize,
}

impl SplashState {
    pub fn new() -> Self {
        Self {
            message: "Starting...".to_string(),
            completed_steps: 0,
        }
    }

    pub fn set_message(&mut self, message: &str) {
        self.message = message.to_string();
    }

    pub fn complete_step(&mut self) {
        self.completed_steps = (self.completed_steps + 1).min(TOTAL_STEPS);
    }

    fn percent(&self) -> u16 {
        (self.completed_steps * 100 / TOTAL_STEPS) as u16
    }
}

impl Default for SplashState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render(f: &mut Frame, state: &SplashState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(11),
            Constraint::Percentage(35),
        ])
        .split(f.area());

    let center = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ])
        .split(chunks[1])[1];

    let mut logo: Vec<Line> = LOGO
        .iter()
        .map(|row| Line::from(Span::styled(*row, Style::default().fg(Color::Cyan))))
        .collect();
    logo.push(Line::from(""));
    logo.push(Line::from(Span::styled(
        "Terminal admin for items, users, questionnaires and mentors",
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));

    let logo_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = logo_block.inner(center);
    f.render_widget(logo_block, center);

    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    f.render_widget(
        Paragraph::new(logo).alignment(Alignment::Center),
        inner_chunks[0],
    );

    let progress = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(state.percent())
        .label(Span::styled(
            state.message.as_str(),
            Style::default().fg(Color::White),
        ));

    f.render_widget(progress, inner_chunks[1]);
}
