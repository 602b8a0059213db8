//! Configuration Management
//!
//! Handles persistent configuration storage for tadmin.

use crate::notification::{DetailLevel, NotificationManager, SoundConfig};
use crate::resource::ResourceKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const ENV_API_URL: &str = "TADMIN_API_URL";
pub const ENV_TOKEN: &str = "TADMIN_TOKEN";
pub const ENV_PASSWORD: &str = "TADMIN_PASSWORD";

/// Toast settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    /// minimal, detailed or verbose
    #[serde(default = "default_detail_level")]
    pub detail_level: String,
    /// off, errors_only or all
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default = "default_toast_seconds")]
    pub toast_seconds: u64,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_detail_level() -> String {
    DetailLevel::default().as_str().to_string()
}

fn default_sound() -> String {
    SoundConfig::default().as_str().to_string()
}

fn default_toast_seconds() -> u64 {
    5
}

fn default_max_history() -> usize {
    50
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            detail_level: default_detail_level(),
            sound: default_sound(),
            toast_seconds: default_toast_seconds(),
            max_history: default_max_history(),
        }
    }
}

impl NotificationSettings {
    pub fn apply(&self, manager: &mut NotificationManager) {
        manager.detail_level = DetailLevel::parse(&self.detail_level);
        manager.sound_config = SoundConfig::parse(&self.sound);
        manager.toast_duration = Duration::from_secs(self.toast_seconds.max(1));
        manager.max_history = self.max_history.max(1);
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    /// Account used for the password login
    #[serde(default)]
    pub email: Option<String>,
    /// Last viewed resource kind
    #[serde(default)]
    pub last_resource: Option<String>,
    #[serde(default)]
    pub notifications: NotificationSettings,
    /// Only configs read from disk are written back
    #[serde(skip)]
    persist: bool,
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tadmin").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        let mut config = if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                    Self::default()
                }),
                Err(_) => Self::default(),
            }
        } else {
            Self::default()
        };
        config.persist = true;
        config
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        if !self.persist {
            return Ok(());
        }
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// API base URL (CLI > environment > config > default)
    pub fn effective_api_url(&self, cli: Option<&str>) -> String {
        resolve(cli, std::env::var(ENV_API_URL).ok(), self.api_url.as_deref())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    /// Login email (CLI > config)
    pub fn effective_email(&self, cli: Option<&str>) -> Option<String> {
        resolve(cli, None, self.email.as_deref())
    }

    /// Resource kind to open (CLI > config > items)
    pub fn effective_resource(&self, cli: Option<&str>) -> ResourceKind {
        resolve(cli, None, self.last_resource.as_deref())
            .and_then(|key| ResourceKind::from_key(&key))
            .unwrap_or(ResourceKind::Item)
    }

    /// Remember the resource kind and save
    pub fn set_last_resource(&mut self, kind: ResourceKind) -> Result<()> {
        self.last_resource = Some(kind.key().to_string());
        self.save()
    }
}

/// First non-blank of CLI value, environment value and config value
fn resolve(cli: Option<&str>, env: Option<String>, config: Option<&str>) -> Option<String> {
    cli.map(str::to_string)
        .into_iter()
        .chain(env)
        .chain(config.map(str::to_string))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(
            resolve(Some("http://cli"), Some("http://env".into()), Some("http://cfg")),
            Some("http://cli".to_string())
        );
        assert_eq!(
            resolve(None, Some("http://env".into()), Some("http://cfg")),
            Some("http://env".to_string())
        );
        assert_eq!(resolve(Some("  "), None, Some("http://cfg")), Some("http://cfg".to_string()));
        assert_eq!(resolve(None, None, None), None);
    }

    #[test]
    fn test_effective_resource_falls_back_to_items() {
        let mut config = Config::default();
        assert_eq!(config.effective_resource(None), ResourceKind::Item);

        config.last_resource = Some("mentors".to_string());
        assert_eq!(config.effective_resource(None), ResourceKind::Mentor);
        assert_eq!(config.effective_resource(Some("user")), ResourceKind::User);

        config.last_resource = Some("bogus".to_string());
        assert_eq!(config.effective_resource(None), ResourceKind::Item);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"email": "admin@example.com"}"#).unwrap();
        assert_eq!(config.email.as_deref(), Some("admin@example.com"));
        assert_eq!(config.notifications, NotificationSettings::default());
    }

    #[test]
    fn test_notification_settings_apply() {
        let settings = NotificationSettings {
            detail_level: "verbose".to_string(),
            sound: "errors".to_string(),
            toast_seconds: 0,
            max_history: 10,
        };
        let mut manager = NotificationManager::new();
        settings.apply(&mut manager);
        assert_eq!(manager.detail_level, DetailLevel::Verbose);
        assert_eq!(manager.sound_config, SoundConfig::ErrorsOnly);
        assert_eq!(manager.toast_duration, Duration::from_secs(1));
        assert_eq!(manager.max_history, 10);
    }
}
