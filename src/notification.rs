//! Notification System
//!
//! Toasts for create/update/delete requests, plus a history panel.
//! A request starts out pending and ends as "Success!" with the kind's
//! message or "Something went wrong." with the server's detail.

use crate::api::error::{format_api_error, ApiError};
use crate::resource::{get_resource, ResourceKind};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const SUCCESS_TITLE: &str = "Success!";
pub const ERROR_TITLE: &str = "Something went wrong.";

/// Level of detail for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    /// Title only
    Minimal,
    /// Title and message
    #[default]
    Detailed,
    /// Title, message, kind and duration
    Verbose,
}

impl DetailLevel {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "verbose" => Self::Verbose,
            _ => Self::Detailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Detailed => "detailed",
            Self::Verbose => "verbose",
        }
    }
}

/// Sound configuration for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundConfig {
    #[default]
    Off,
    ErrorsOnly,
    All,
}

impl SoundConfig {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "errors_only" | "errors" => Self::ErrorsOnly,
            "all" => Self::All,
            _ => Self::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::ErrorsOnly => "errors_only",
            Self::All => "all",
        }
    }
}

/// Mutation being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn present_participle(&self) -> &'static str {
        match self {
            Self::Create => "Saving",
            Self::Update => "Updating",
            Self::Delete => "Deleting",
        }
    }

    /// Success text from the registry, with a generic fallback
    pub fn success_message(&self, kind: ResourceKind) -> String {
        let messages = &get_resource(kind).messages;
        let configured = match self {
            Self::Create => Some(messages.created.as_str()),
            Self::Update => messages.updated.as_deref(),
            Self::Delete => Some(messages.deleted.as_str()),
        };
        match configured {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!("{} saved successfully.", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    Pending,
    Success,
    Error(String),
}

impl NotificationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_))
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Pending => "↻",
            Self::Success => "✓",
            Self::Error(_) => "✗",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub operation: Operation,
    pub kind: ResourceKind,
    /// Record the request concerns, when there is one
    pub subject: Option<String>,
    pub status: NotificationStatus,
    pub created_at: Instant,
    pub completed_at: Option<Instant>,
}

impl Notification {
    pub fn new(operation: Operation, kind: ResourceKind, subject: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation,
            kind,
            subject,
            status: NotificationStatus::Pending,
            created_at: Instant::now(),
            completed_at: None,
        }
    }

    pub fn set_success(&mut self) {
        self.status = NotificationStatus::Success;
        self.completed_at = Some(Instant::now());
    }

    pub fn set_error(&mut self, error: &ApiError) {
        self.status = NotificationStatus::Error(format_api_error(error));
        self.completed_at = Some(Instant::now());
    }

    pub fn title(&self) -> String {
        match &self.status {
            NotificationStatus::Pending => format!(
                "{} {}...",
                self.operation.present_participle(),
                self.kind.name().to_lowercase()
            ),
            NotificationStatus::Success => SUCCESS_TITLE.to_string(),
            NotificationStatus::Error(_) => ERROR_TITLE.to_string(),
        }
    }

    /// Body text: the success message or the error detail
    pub fn description(&self) -> Option<String> {
        match &self.status {
            NotificationStatus::Pending => self.subject.clone(),
            NotificationStatus::Success => Some(self.operation.success_message(self.kind)),
            NotificationStatus::Error(detail) => Some(detail.clone()),
        }
    }

    pub fn duration(&self) -> Duration {
        self.completed_at
            .unwrap_or_else(Instant::now)
            .duration_since(self.created_at)
    }

    pub fn duration_display(&self) -> String {
        let d = self.duration();
        if d.as_secs() < 1 {
            format!("{}ms", d.as_millis())
        } else if d.as_secs() < 60 {
            format!("{}s", d.as_secs())
        } else {
            format!("{}m{}s", d.as_secs() / 60, d.as_secs() % 60)
        }
    }

    /// One-line form for the toast
    pub fn toast_message(&self, detail_level: DetailLevel) -> String {
        let icon = self.status.icon();
        let title = self.title();

        match (detail_level, self.description()) {
            (DetailLevel::Minimal, _) | (_, None) => format!("{} {}", icon, title),
            (DetailLevel::Detailed, Some(description)) => {
                format!("{} {} {}", icon, title, description)
            }
            (DetailLevel::Verbose, Some(description)) => format!(
                "{} {} {} [{}, {}]",
                icon,
                title,
                description,
                self.kind.key(),
                self.duration_display()
            ),
        }
    }
}

pub struct NotificationManager {
    /// Most recent first
    pub notifications: VecDeque<Notification>,
    pub max_history: usize,
    pub toast_duration: Duration,
    pub detail_level: DetailLevel,
    pub sound_config: SoundConfig,
    last_toast_time: Option<Instant>,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self {
            notifications: VecDeque::new(),
            max_history: 50,
            toast_duration: Duration::from_secs(5),
            detail_level: DetailLevel::Detailed,
            sound_config: SoundConfig::Off,
            last_toast_time: None,
        }
    }

    /// Record a request that was just sent
    pub fn start(&mut self, operation: Operation, kind: ResourceKind, subject: Option<String>) -> Uuid {
        let notification = Notification::new(operation, kind, subject);
        let id = notification.id;
        self.notifications.push_front(notification);
        self.last_toast_time = Some(Instant::now());
        self.trim_history();
        id
    }

    pub fn mark_success(&mut self, id: Uuid) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_success();
            self.last_toast_time = Some(Instant::now());
            if self.sound_config == SoundConfig::All {
                self.play_beep();
            }
        }
    }

    pub fn mark_error(&mut self, id: Uuid, error: &ApiError) {
        if let Some(notif) = self.notifications.iter_mut().find(|n| n.id == id) {
            notif.set_error(error);
            self.last_toast_time = Some(Instant::now());
            if matches!(self.sound_config, SoundConfig::ErrorsOnly | SoundConfig::All) {
                self.play_beep();
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    /// Most recent notification while its toast is still visible
    pub fn current_toast(&self) -> Option<&Notification> {
        let last_time = self.last_toast_time?;
        if last_time.elapsed() > self.toast_duration {
            return None;
        }
        self.notifications.front()
    }

    pub fn pending_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.status == NotificationStatus::Pending)
            .count()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.last_toast_time = None;
    }

    fn trim_history(&mut self) {
        while self.notifications.len() > self.max_history {
            // Drop the oldest finished one first
            if let Some(pos) = self.notifications.iter().rposition(|n| n.status.is_terminal()) {
                self.notifications.remove(pos);
            } else {
                self.notifications.pop_back();
            }
        }
    }

    fn play_beep(&self) {
        print!("\x07");
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }
}
