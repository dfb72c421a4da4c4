//! Application settings singleton.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fields::{DefaultView, Theme};

/// User-facing preferences, persisted under their own storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_user_name")]
    pub user_name: String,
    /// Hours before a due date at which a task starts counting as a notification.
    #[serde(default = "default_lead_time")]
    pub notification_lead_time: u32,
    #[serde(default)]
    pub default_view: DefaultView,
    #[serde(default)]
    pub theme: Theme,
}

fn default_user_name() -> String {
    "Office Manager".to_string()
}

fn default_lead_time() -> u32 {
    24
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            notification_lead_time: default_lead_time(),
            default_view: DefaultView::default(),
            theme: Theme::default(),
        }
    }
}

/// A single change made through the settings command.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    UserName(String),
    NotificationLeadTime(u32),
    DefaultView(DefaultView),
    Theme(Theme),
}

impl AppSettings {
    /// Apply a batch of changes. Nothing is applied if any change is invalid.
    pub fn apply(&mut self, updates: &[SettingsUpdate]) -> Result<()> {
        for u in updates {
            if let SettingsUpdate::UserName(name) = u {
                if name.trim().is_empty() {
                    return Err(Error::Validation("user name cannot be empty".into()));
                }
            }
        }
        for u in updates {
            match u {
                SettingsUpdate::UserName(name) => self.user_name = name.trim().to_string(),
                SettingsUpdate::NotificationLeadTime(h) => self.notification_lead_time = *h,
                SettingsUpdate::DefaultView(v) => self.default_view = *v,
                SettingsUpdate::Theme(t) => self.theme = *t,
            }
        }
        Ok(())
    }
}
