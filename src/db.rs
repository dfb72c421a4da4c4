//! Task store and utility functions for task management.
//!
//! This module provides the `Database` struct, the single owned state object
//! holding the task collection and the settings singleton. Every mutation of
//! a task goes through one of its operations. It also carries the date
//! parsing, formatting and lookup helpers shared by the command handlers.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fields::*;
use crate::settings::{AppSettings, SettingsUpdate};
use crate::stats::is_overdue_by_due_date;
use crate::storage::{read_json, write_json, KeyValueStore, SETTINGS_KEY, TASKS_KEY};
use crate::task::{split_and_normalise_tags, Comment, Subtask, Task, TaskDraft, TaskUpdate};

/// In-memory task store plus settings.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Database {
    pub tasks: Vec<Task>,
    pub settings: AppSettings,
}

impl Database {
    /// Load tasks and settings from a store.
    ///
    /// Absent or unreadable task data falls back to the seed dataset when
    /// `seed` is set, otherwise to an empty collection. Absent or unreadable
    /// settings fall back to defaults. Nothing here fails.
    pub fn load(store: &dyn KeyValueStore, seed: bool) -> Self {
        let fallback = || if seed { seed_tasks(Local::now().date_naive(), Utc::now()) } else { Vec::new() };
        let tasks = match read_json::<Vec<Task>>(store, TASKS_KEY) {
            Ok(Some(mut tasks)) => {
                let repaired = repair_ids(&mut tasks);
                if repaired > 0 {
                    warn!(store = store.name(), repaired, "renumbered missing or duplicate ids");
                }
                tasks
            }
            Ok(None) => fallback(),
            Err(e) => {
                warn!(store = store.name(), error = %e, "error reading tasks, starting from fallback");
                fallback()
            }
        };
        let settings = match read_json::<AppSettings>(store, SETTINGS_KEY) {
            Ok(Some(s)) => s,
            Ok(None) => AppSettings::default(),
            Err(e) => {
                warn!(store = store.name(), error = %e, "error reading settings, using defaults");
                AppSettings::default()
            }
        };
        Database { tasks, settings }
    }

    /// Write both the task collection and the settings.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        self.save_tasks(store)?;
        self.save_settings(store)
    }

    pub fn save_tasks(&self, store: &dyn KeyValueStore) -> Result<()> {
        write_json(store, TASKS_KEY, &self.tasks)?;
        info!(store = store.name(), count = self.tasks.len(), "saved tasks");
        Ok(())
    }

    pub fn save_settings(&self, store: &dyn KeyValueStore) -> Result<()> {
        write_json(store, SETTINGS_KEY, &self.settings)
    }

    /// Generate the next available task ID.
    pub fn next_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id).ok_or(Error::NotFound(id))
    }

    /// Create a task from a draft and return its ID.
    pub fn create(&mut self, draft: TaskDraft) -> Result<u64> {
        let title = validate_title(&draft.title)?;
        let now = Utc::now();
        let id = self.next_id();
        let mut task = Task {
            id,
            title,
            description: draft.description,
            assigned_to: draft.assigned_to.trim().to_string(),
            due_date: draft.due_date,
            created_date: now,
            completed_date: None,
            priority: draft.priority,
            status: Status::Pending,
            category: draft.category.trim().to_string(),
            tags: split_and_normalise_tags(&draft.tags),
            subtasks: Vec::new(),
            comments: Vec::new(),
            notification_sent: false,
        };
        set_status(&mut task, draft.status, now);
        self.tasks.push(task);
        info!(id, "created task");
        Ok(id)
    }

    /// Apply a batch of edits to a task.
    ///
    /// All edits are validated first; if any is invalid the task is left
    /// untouched. Status edits maintain the completed date.
    pub fn update(&mut self, id: u64, updates: &[TaskUpdate]) -> Result<()> {
        for u in updates {
            if let TaskUpdate::Title(t) = u {
                validate_title(t)?;
            }
        }
        let now = Utc::now();
        let task = self.get_mut(id)?;
        for u in updates {
            match u {
                TaskUpdate::Title(t) => task.title = t.trim().to_string(),
                TaskUpdate::Description(d) => task.description = d.clone(),
                TaskUpdate::AssignedTo(a) => task.assigned_to = a.trim().to_string(),
                TaskUpdate::Priority(p) => task.priority = *p,
                TaskUpdate::Status(s) => set_status(task, *s, now),
                TaskUpdate::Category(c) => task.category = c.trim().to_string(),
                TaskUpdate::DueDate(d) => task.due_date = *d,
                TaskUpdate::Tags(tags) => task.tags = split_and_normalise_tags(tags),
                TaskUpdate::NotificationSent(b) => task.notification_sent = *b,
            }
        }
        info!(id, edits = updates.len(), "updated task");
        Ok(())
    }

    /// Remove a task with its subtasks and comments. Returns whether it existed.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Flip a task between completed and pending, returning the new status.
    pub fn toggle_status(&mut self, id: u64) -> Result<Status> {
        let task = self.get_mut(id)?;
        let next = if task.status == Status::Completed { Status::Pending } else { Status::Completed };
        set_status(task, next, Utc::now());
        Ok(next)
    }

    /// Append a subtask and return its ID.
    pub fn add_subtask(
        &mut self,
        id: u64,
        title: &str,
        assigned_to: Option<String>,
        due_date: Option<NaiveDate>,
    ) -> Result<u64> {
        let title = validate_title(title)?;
        let task = self.get_mut(id)?;
        let sub_id = task.next_subtask_id();
        task.subtasks.push(Subtask {
            id: sub_id,
            title,
            completed: false,
            assigned_to: assigned_to.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()),
            due_date,
        });
        Ok(sub_id)
    }

    /// Flip a subtask's completed flag, returning the new value.
    pub fn toggle_subtask(&mut self, id: u64, subtask: u64) -> Result<bool> {
        let task = self.get_mut(id)?;
        let st = task
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask)
            .ok_or(Error::SubtaskNotFound { task: id, subtask })?;
        st.completed = !st.completed;
        Ok(st.completed)
    }

    pub fn remove_subtask(&mut self, id: u64, subtask: u64) -> Result<()> {
        let task = self.get_mut(id)?;
        let before = task.subtasks.len();
        task.subtasks.retain(|s| s.id != subtask);
        if task.subtasks.len() == before {
            return Err(Error::SubtaskNotFound { task: id, subtask });
        }
        Ok(())
    }

    /// Append a comment and return its ID.
    pub fn add_comment(&mut self, id: u64, text: &str, author: &str) -> Result<u64> {
        if text.trim().is_empty() {
            return Err(Error::Validation("comment cannot be empty".into()));
        }
        let task = self.get_mut(id)?;
        let comment_id = task.next_comment_id();
        task.comments.push(Comment {
            id: comment_id,
            text: text.trim().to_string(),
            author: author.to_string(),
            timestamp: Utc::now(),
        });
        Ok(comment_id)
    }

    pub fn update_settings(&mut self, updates: &[SettingsUpdate]) -> Result<()> {
        self.settings.apply(updates)
    }

    /// Drop every task. Settings are kept.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Distinct assignees in first-seen order.
    pub fn people(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for t in &self.tasks {
            if !seen.contains(&t.assigned_to.as_str()) {
                seen.push(t.assigned_to.as_str());
            }
        }
        seen
    }

    /// Distinct non-empty categories with their task counts.
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for t in &self.tasks {
            if !t.category.is_empty() {
                *counts.entry(t.category.clone()).or_default() += 1;
            }
        }
        counts
    }
}

/// Give every task, and every subtask and comment within its task, a unique
/// non-zero id. Ids that are 0 or repeat an earlier one get `max + 1`.
/// Returns how many ids changed.
fn repair_ids(tasks: &mut [Task]) -> usize {
    let mut changed = unique_ids(tasks.iter_mut().map(|t| &mut t.id));
    for t in tasks.iter_mut() {
        changed += unique_ids(t.subtasks.iter_mut().map(|s| &mut s.id));
        changed += unique_ids(t.comments.iter_mut().map(|c| &mut c.id));
    }
    changed
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a mut u64>) -> usize {
    let mut ids: Vec<&mut u64> = ids.collect();
    let mut next = ids.iter().map(|id| **id).max().unwrap_or(0).saturating_add(1);
    let mut seen = HashSet::new();
    let mut changed = 0;
    for id in ids.iter_mut() {
        if **id == 0 || !seen.insert(**id) {
            **id = next;
            seen.insert(next);
            next = next.saturating_add(1);
            changed += 1;
        }
    }
    changed
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("title cannot be empty".into()));
    }
    Ok(trimmed.to_string())
}

/// The one place a task's status changes.
///
/// Moving to completed stamps the completed date unless the task already had
/// one; moving anywhere else clears it.
fn set_status(task: &mut Task, status: Status, now: DateTime<Utc>) {
    if status == Status::Completed {
        if task.status != Status::Completed || task.completed_date.is_none() {
            task.completed_date = Some(now);
        }
    } else {
        task.completed_date = None;
    }
    task.status = status;
}

/// Tasks shown on first run when no stored data exists.
pub fn seed_tasks(today: NaiveDate, now: DateTime<Utc>) -> Vec<Task> {
    let make = |id: u64, title: &str, desc: &str, who: &str, days: i64, priority: Priority, status: Status, category: &str| Task {
        id,
        title: title.into(),
        description: desc.into(),
        assigned_to: who.into(),
        due_date: Some(today + Duration::days(days)),
        created_date: now,
        completed_date: if status == Status::Completed { Some(now) } else { None },
        priority,
        status,
        category: category.into(),
        tags: Vec::new(),
        subtasks: Vec::new(),
        comments: Vec::new(),
        notification_sent: false,
    };
    vec![
        make(1, "Complete project proposal", "Draft and submit Q4 proposal", "John Doe", 4, Priority::Critical, Status::Pending, "Planning"),
        make(2, "Review code changes", "Review PR #234", "Jane Smith", 3, Priority::High, Status::Pending, "Development"),
        make(3, "Update documentation", "API documentation update", "Mike Johnson", 8, Priority::Medium, Status::Completed, "Documentation"),
        make(4, "Team meeting prep", "Prepare slides for weekly sync", "Sarah Wilson", 5, Priority::Low, Status::Pending, "Meetings"),
    ]
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "friday", "this friday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_relative(s, Local::now().date_naive())
}

/// [`parse_due_input`] against an explicit today.
pub fn parse_due_relative(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 { (today.year() + 1, 1) } else { (today.year(), today.month() + 1) };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(unit) = rest.chars().last() {
            let num = &rest[..rest.len() - unit.len_utf8()];
            if let Ok(n) = num.trim().parse::<i64>() {
                let span = match unit {
                    'd' => Some(Duration::try_days(n)),
                    'w' => Some(Duration::try_weeks(n)),
                    // Approximate: 30 days per month
                    'm' => Some(n.checked_mul(30).and_then(Duration::try_days)),
                    _ => None,
                };
                if let Some(span) = span {
                    return span.and_then(|span| today.checked_add_signed(span));
                }
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {}", day_name) {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {}", day_name) {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {}d", delta)
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<5} {:<12} {:<9} {:<10} {:<16} {}",
        "ID", "Status", "Priority", "Due", "Assignee", "Title [tags]"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = if t.tags.is_empty() { String::new() } else { format!(" [{}]", t.tags.join(",")) };
        let mut due = format_due_relative(t.due_date, today);
        if is_overdue_by_due_date(t, today) {
            due.push('!');
        }
        let assignee = if t.assigned_to.is_empty() { "-" } else { t.assigned_to.as_str() };
        println!(
            "{:<5} {:<12} {:<9} {:<10} {:<16} {}{}",
            t.id,
            format_status(t.status),
            format_priority(t.priority),
            due,
            truncate(assignee, 16),
            t.title,
            tags
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Resolve a task identifier (either ID or title) to a task ID.
/// Returns an error if the title has multiple matches and suggests using ID instead.
pub fn resolve_task_identifier(identifier: &str, db: &Database) -> std::result::Result<u64, String> {
    if let Ok(id) = identifier.parse::<u64>() {
        return if db.get(id).is_some() { Ok(id) } else { Err(format!("Task with ID {} not found", id)) };
    }

    let matches: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|task| task.title.to_lowercase() == identifier.to_lowercase())
        .collect();

    match matches.len() {
        0 => Err(format!("No task found with title '{}'", identifier)),
        1 => Ok(matches[0].id),
        _ => {
            let mut error_msg = format!("Multiple tasks found with title '{}':\n", identifier);
            for task in matches {
                error_msg.push_str(&format!("  ID {}: {} ({})\n", task.id, task.title, format_status(task.status)));
            }
            error_msg.push_str("Please use the specific ID instead.");
            Err(error_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn db_with(title: &str) -> (Database, u64) {
        let mut db = Database::default();
        let id = db.create(TaskDraft::new(title)).unwrap();
        (db, id)
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let mut db = Database::default();
        let err = db.create(TaskDraft::new("   ")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let mut db = Database::default();
        let a = db.create(TaskDraft::new("a")).unwrap();
        let b = db.create(TaskDraft::new("b")).unwrap();
        db.delete(a);
        let c = db.create(TaskDraft::new("c")).unwrap();
        assert_ne!(b, c);
        let mut ids: Vec<u64> = db.tasks.iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), db.tasks.len());
    }

    #[test]
    fn test_status_transitions_maintain_completed_date() {
        let (mut db, id) = db_with("Audit");
        assert!(db.get(id).unwrap().completed_date.is_none());

        db.update(id, &[TaskUpdate::Status(Status::Completed)]).unwrap();
        let stamped = db.get(id).unwrap().completed_date;
        assert!(stamped.is_some());

        // Re-completing keeps the original stamp.
        db.update(id, &[TaskUpdate::Status(Status::Completed)]).unwrap();
        assert_eq!(db.get(id).unwrap().completed_date, stamped);

        db.update(id, &[TaskUpdate::Status(Status::Pending)]).unwrap();
        assert!(db.get(id).unwrap().completed_date.is_none());
    }

    #[test]
    fn test_draft_created_as_completed_is_stamped() {
        let mut db = Database::default();
        let draft = TaskDraft { status: Status::Completed, ..TaskDraft::new("done already") };
        let id = db.create(draft).unwrap();
        assert!(db.get(id).unwrap().completed_date.is_some());
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let (mut db, id) = db_with("Audit");
        let err = db
            .update(id, &[TaskUpdate::Priority(Priority::Critical), TaskUpdate::Title(" ".into())])
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(db.get(id).unwrap().priority, Priority::Medium);
        assert!(matches!(db.update(99, &[]), Err(Error::NotFound(99))));
    }

    #[test]
    fn test_toggle_only_flips_between_completed_and_pending() {
        let (mut db, id) = db_with("Audit");
        db.update(id, &[TaskUpdate::Status(Status::InProgress)]).unwrap();
        assert_eq!(db.toggle_status(id).unwrap(), Status::Completed);
        assert!(db.get(id).unwrap().completed_date.is_some());
        assert_eq!(db.toggle_status(id).unwrap(), Status::Pending);
        assert!(db.get(id).unwrap().completed_date.is_none());
        assert_eq!(db.toggle_status(id).unwrap(), Status::Completed);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (mut db, id) = db_with("Audit");
        db.add_subtask(id, "Dock 4", None, None).unwrap();
        db.add_comment(id, "Missing manifest", "Giuseppe").unwrap();
        assert!(db.delete(id));
        assert!(!db.delete(id));
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn test_subtasks_and_comments() {
        let (mut db, id) = db_with("Q4 report");
        let a = db.add_subtask(id, "Collect IT budget", Some("Marco".into()), None).unwrap();
        let b = db.add_subtask(id, "Review HR costs", Some(" ".into()), None).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(db.get(id).unwrap().subtasks[1].assigned_to, None);
        assert!(db.toggle_subtask(id, a).unwrap());
        assert_eq!(db.get(id).unwrap().completed_subtasks(), 1);
        assert!(matches!(db.toggle_subtask(id, 9), Err(Error::SubtaskNotFound { .. })));
        db.remove_subtask(id, a).unwrap();
        assert_eq!(db.get(id).unwrap().subtasks.len(), 1);
        assert!(db.add_comment(id, "", "me").is_err());
    }

    #[test]
    fn test_round_trip_through_store() {
        let store = MemoryStore::new();
        let mut db = Database::default();
        let id = db.create(TaskDraft { due_date: NaiveDate::from_ymd_opt(2025, 12, 1), ..TaskDraft::new("Audit") }).unwrap();
        db.add_subtask(id, "Dock 4", None, None).unwrap();
        db.update(id, &[TaskUpdate::Status(Status::Completed)]).unwrap();
        db.save(&store).unwrap();

        let loaded = Database::load(&store, true);
        assert_eq!(loaded, db);
    }

    #[test]
    fn test_load_keeps_string_id_data() {
        let store = MemoryStore::new();
        let stored = r#"[
            {"id":"t-1","title":"Dock inspection","createdAt":"2025-11-01T08:00:00Z","status":"pending",
             "subtasks":[{"id":"st-1","title":"North"},{"id":"st-1","title":"South"}]},
            {"id":"t-1","title":"Crane permit","createdAt":"2025-11-01T08:00:00Z"},
            {"id":"legacy","title":"Fire drill","createdAt":"2025-11-01T08:00:00Z"}
        ]"#;
        store.write(TASKS_KEY, stored.as_bytes()).unwrap();

        let db = Database::load(&store, true);
        let titles: Vec<_> = db.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Dock inspection", "Crane permit", "Fire drill"]);
        let ids: Vec<_> = db.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let sub_ids: Vec<_> = db.tasks[0].subtasks.iter().map(|s| s.id).collect();
        assert_eq!(sub_ids, vec![1, 2]);
        assert_eq!(db.next_id(), 4);
    }

    #[test]
    fn test_load_fallbacks() {
        let store = MemoryStore::new();
        assert_eq!(Database::load(&store, true).tasks.len(), 4);
        assert!(Database::load(&store, false).tasks.is_empty());

        store.write(TASKS_KEY, b"{broken").unwrap();
        store.write(SETTINGS_KEY, b"42").unwrap();
        let db = Database::load(&store, false);
        assert!(db.tasks.is_empty());
        assert_eq!(db.settings, AppSettings::default());
    }

    #[test]
    fn test_people_in_first_seen_order() {
        let mut db = Database::default();
        for (title, who) in [("a", "Zoe"), ("b", "Adam"), ("c", "Zoe")] {
            db.create(TaskDraft { assigned_to: who.into(), ..TaskDraft::new(title) }).unwrap();
        }
        assert_eq!(db.people(), vec!["Zoe", "Adam"]);
    }

    #[test]
    fn test_parse_due_relative() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(); // Wednesday
        assert_eq!(parse_due_relative("tomorrow", today), NaiveDate::from_ymd_opt(2025, 11, 27));
        assert_eq!(parse_due_relative("in 2w", today), NaiveDate::from_ymd_opt(2025, 12, 10));
        assert_eq!(parse_due_relative("friday", today), NaiveDate::from_ymd_opt(2025, 11, 28));
        assert_eq!(parse_due_relative("next wed", today), NaiveDate::from_ymd_opt(2025, 12, 3));
        assert_eq!(parse_due_relative("eom", today), NaiveDate::from_ymd_opt(2025, 11, 30));
        assert_eq!(parse_due_relative("2026-01-05", today), NaiveDate::from_ymd_opt(2026, 1, 5));
        assert_eq!(parse_due_relative("someday", today), None);
        assert_eq!(parse_due_relative("in -3d", today), NaiveDate::from_ymd_opt(2025, 11, 23));
    }

    #[test]
    fn test_parse_due_relative_out_of_range_is_none() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 26).unwrap();
        assert_eq!(parse_due_relative("in 9999999999d", today), None);
        assert_eq!(parse_due_relative("in 999999999999999999m", today), None);
        assert_eq!(parse_due_relative("in 9223372036854775807w", today), None);
        assert_eq!(parse_due_relative("in -9999999999d", today), None);
    }

    #[test]
    fn test_format_due_relative_and_truncate() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 26).unwrap();
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(format_due_relative(today.pred_opt(), today), "1d late");
        assert_eq!(truncate("Giuseppe Verdi", 6), "Giuse…");
        assert_eq!(truncate("Ada", 6), "Ada");
    }

    #[test]
    fn test_resolve_task_identifier() {
        let (mut db, id) = db_with("Audit");
        assert_eq!(resolve_task_identifier("audit", &db), Ok(id));
        assert_eq!(resolve_task_identifier(&id.to_string(), &db), Ok(id));
        db.create(TaskDraft::new("Audit")).unwrap();
        assert!(resolve_task_identifier("Audit", &db).is_err());
    }
}
