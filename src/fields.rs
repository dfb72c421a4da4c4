//! Enumerations and field types for task management.
//!
//! This module defines the structured values used to classify tasks and
//! settings: priorities, statuses, the landing view and the colour theme,
//! together with their display and parse helpers.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// All priorities, most severe first.
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Sort rank, lower is more severe.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Wire value, as used in stored data and CSS class names.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// Task lifecycle status.
///
/// `Overdue` is a value a task can be *stored* with. Whether a task is
/// overdue by its due date is a separate, derived judgment
/// (see [`crate::stats::is_overdue_by_due_date`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "InProgress", alias = "in_progress")]
    InProgress,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Overdue")]
    Overdue,
}

impl Status {
    /// Order in which report groups are rendered.
    pub const REPORT_ORDER: [Status; 4] = [
        Status::Overdue,
        Status::InProgress,
        Status::Pending,
        Status::Completed,
    ];

    /// Wire value, as used in stored data and CSS class names.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in-progress",
            Status::Completed => "completed",
            Status::Overdue => "overdue",
        }
    }
}

/// View shown when the application starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultView {
    #[default]
    Dashboard,
    All,
    Person,
    Date,
    Categories,
}

/// Colour theme.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Due,
    Priority,
    Id,
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
        Priority::Critical => "Critical",
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Pending => "Pending",
        Status::InProgress => "In Progress",
        Status::Completed => "Completed",
        Status::Overdue => "Overdue",
    }
}

/// Format a landing view for display.
pub fn format_view(v: DefaultView) -> &'static str {
    match v {
        DefaultView::Dashboard => "dashboard",
        DefaultView::All => "all",
        DefaultView::Person => "person",
        DefaultView::Date => "date",
        DefaultView::Categories => "categories",
    }
}

/// Format a theme for display.
pub fn format_theme(t: Theme) -> &'static str {
    match t {
        Theme::Light => "light",
        Theme::Dark => "dark",
    }
}

/// Parse a priority string leniently, case-insensitive.
pub fn parse_priority(s: &str) -> Option<Priority> {
    match s.trim().to_lowercase().as_str() {
        "low" => Some(Priority::Low),
        "medium" => Some(Priority::Medium),
        "high" => Some(Priority::High),
        "critical" => Some(Priority::Critical),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_values() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in-progress\"");
        let s: Status = serde_json::from_str("\"overdue\"").unwrap();
        assert_eq!(s, Status::Overdue);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_priority(" Critical "), Some(Priority::Critical));
        assert_eq!(parse_priority("urgent"), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Status::default(), Status::Pending);
        assert_eq!(DefaultView::default(), DefaultView::Dashboard);
        assert_eq!(Theme::default(), Theme::Light);
    }

    #[test]
    fn test_priority_rank_orders_by_severity() {
        let mut ps = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
        ps.sort_by_key(|p| p.rank());
        assert_eq!(ps, Priority::ALL.to_vec());
    }
}
