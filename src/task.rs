//! Task data structures.
//!
//! This module defines the `Task` record with its exclusively owned subtasks
//! and comments, the `TaskDraft` used to create a task, and the `TaskUpdate`
//! variants through which every edit to an existing task flows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::*;

/// A work item with its metadata, subtasks and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "id_format::deserialize")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "assignee")]
    pub assigned_to: String,
    #[serde(default, with = "due_date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(alias = "createdAt")]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub notification_sent: bool,
}

impl Task {
    /// Number of subtasks marked completed.
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }

    pub(crate) fn next_subtask_id(&self) -> u64 {
        self.subtasks.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    pub(crate) fn next_comment_id(&self) -> u64 {
        self.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }
}

/// A checklist item owned by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    #[serde(deserialize_with = "id_format::deserialize")]
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, with = "due_date_format", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// A note left on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "id_format::deserialize")]
    pub id: u64,
    pub text: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// Field values for a task that does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub status: Status,
    pub category: String,
    pub tags: Vec<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A single edit to an existing task.
///
/// Edits are applied by [`crate::db::Database::update`], which is also where
/// the completed-date rule for status changes is enforced.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskUpdate {
    Title(String),
    Description(String),
    AssignedTo(String),
    Priority(Priority),
    Status(Status),
    Category(String),
    DueDate(Option<NaiveDate>),
    Tags(Vec<String>),
    NotificationSent(bool),
}

/// Normalise a tag string by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalise each tag.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    let mut tags = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let tag = normalise_tag(part);
            if !tag.is_empty() {
                tags.push(tag);
            }
        }
    }
    tags.sort();
    tags.dedup();
    tags
}

/// Ids are written as numbers. Older data used prefixed strings such as
/// `"t-12"` or `"st-3"`; those read as their trailing number, and a string
/// without one reads as 0, which [`crate::db::Database::load`] renumbers.
mod id_format {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => n,
            RawId::Text(s) => trailing_number(&s),
        })
    }

    pub(super) fn trailing_number(s: &str) -> u64 {
        let s = s.trim();
        let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        s[s.len() - digits..].parse().unwrap_or(0)
    }
}

/// Due dates are written as `YYYY-MM-DD`. Older data stored full RFC 3339
/// timestamps or empty strings, both of which are accepted on read.
mod due_date_format {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else { return Ok(None) };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(Some(d));
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc).date_naive()))
            .map_err(serde::de::Error::custom)
    }
}
