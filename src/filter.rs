//! List filtering: free-text search plus status, priority, person and
//! category selectors. A `None` selector matches everything.

use crate::fields::{Priority, Status};
use crate::task::Task;

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub search: String,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub person: Option<String>,
    pub category: Option<String>,
}

impl FilterState {
    /// Whether a task passes every active filter.
    ///
    /// Search is a case-insensitive substring match on title or description.
    pub fn matches(&self, task: &Task) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty()
            && !task.title.to_lowercase().contains(&needle)
            && !task.description.to_lowercase().contains(&needle)
        {
            return false;
        }
        if self.status.is_some_and(|s| task.status != s) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if let Some(ref person) = self.person {
            if !task.assigned_to.eq_ignore_ascii_case(person) {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if !task.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}
