//! Aggregations over a task snapshot.
//!
//! Everything here is a pure function of the tasks passed in (and of "today"
//! where dates matter). Nothing is cached; callers recompute on every read.
//!
//! Two notions of "overdue" coexist and are deliberately kept apart:
//! [`is_overdue_by_status`] looks only at the stored status, while
//! [`is_overdue_by_due_date`] derives the judgment from the due date. They
//! can disagree, and the counters built on each keep that disagreement.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

use crate::fields::{Priority, Status};
use crate::task::Task;

/// Task counts per stored status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl StatusCounts {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Pending => self.pending,
            Status::InProgress => self.in_progress,
            Status::Completed => self.completed,
            Status::Overdue => self.overdue,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.overdue
    }
}

/// Task counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Critical => self.critical,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// Dashboard snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_progress: usize,
    /// Tasks whose stored status is overdue.
    pub overdue: usize,
    pub due_today: usize,
    /// Non-completed tasks only.
    pub by_priority: PriorityCounts,
    pub completion_rate: u32,
}

impl Stats {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let counts = status_counts(tasks);
        Stats {
            total: tasks.len(),
            completed: counts.completed,
            pending: counts.pending,
            in_progress: counts.in_progress,
            overdue: counts.overdue,
            due_today: tasks.iter().filter(|t| is_due_today(t, today)).count(),
            by_priority: priority_distribution(tasks),
            completion_rate: completion_rate(counts.completed, tasks.len()),
        }
    }
}

pub fn status_counts(tasks: &[Task]) -> StatusCounts {
    let mut c = StatusCounts::default();
    for t in tasks {
        match t.status {
            Status::Pending => c.pending += 1,
            Status::InProgress => c.in_progress += 1,
            Status::Completed => c.completed += 1,
            Status::Overdue => c.overdue += 1,
        }
    }
    c
}

/// Percentage of completed tasks, rounded half away from zero. 0 when there are no tasks.
pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Priority counts over tasks that are not completed.
pub fn priority_distribution(tasks: &[Task]) -> PriorityCounts {
    let mut c = PriorityCounts::default();
    for t in tasks.iter().filter(|t| t.status != Status::Completed) {
        match t.priority {
            Priority::Critical => c.critical += 1,
            Priority::High => c.high += 1,
            Priority::Medium => c.medium += 1,
            Priority::Low => c.low += 1,
        }
    }
    c
}

/// Tasks with high or critical priority, completed ones included.
pub fn high_priority_count(tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|t| matches!(t.priority, Priority::High | Priority::Critical))
        .count()
}

pub fn is_overdue_by_status(task: &Task) -> bool {
    task.status == Status::Overdue
}

/// Due date strictly before today and not completed.
pub fn is_overdue_by_due_date(task: &Task, today: NaiveDate) -> bool {
    task.status != Status::Completed && task.due_date.is_some_and(|d| d < today)
}

/// Due today, whatever the status.
pub fn is_due_today(task: &Task, today: NaiveDate) -> bool {
    task.due_date == Some(today)
}

pub fn overdue_by_status_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| is_overdue_by_status(t)).count()
}

pub fn overdue_by_due_date_count(tasks: &[Task], today: NaiveDate) -> usize {
    tasks.iter().filter(|t| is_overdue_by_due_date(t, today)).count()
}

/// Tasks that deserve a notification at `now`: not completed, and either
/// overdue by due date or due within `lead_time_hours`.
///
/// A due date counts as the start of that local day.
pub fn notification_count<Tz: TimeZone>(tasks: &[Task], now: DateTime<Tz>, lead_time_hours: u32) -> usize {
    let now = now.with_timezone(&Local);
    let today = now.date_naive();
    let horizon = now.naive_local() + Duration::hours(i64::from(lead_time_hours));
    tasks
        .iter()
        .filter(|t| t.status != Status::Completed)
        .filter(|t| {
            is_overdue_by_due_date(t, today)
                || t.due_date
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .is_some_and(|due| due <= horizon)
        })
        .count()
}

/// Tasks assigned to one person.
#[derive(Debug, Clone)]
pub struct PersonGroup<'a> {
    pub person: &'a str,
    pub tasks: Vec<&'a Task>,
}

impl PersonGroup<'_> {
    pub fn completed(&self) -> usize {
        self.tasks.iter().filter(|t| t.status == Status::Completed).count()
    }

    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn completion_rate(&self) -> u32 {
        completion_rate(self.completed(), self.total())
    }
}

/// Group tasks by assignee, groups in first-seen order, tasks in input order.
pub fn group_by_person(tasks: &[Task]) -> Vec<PersonGroup<'_>> {
    let mut groups: Vec<PersonGroup<'_>> = Vec::new();
    for t in tasks {
        match groups.iter_mut().find(|g| g.person == t.assigned_to) {
            Some(g) => g.tasks.push(t),
            None => groups.push(PersonGroup {
                person: t.assigned_to.as_str(),
                tasks: vec![t],
            }),
        }
    }
    groups
}

/// Tasks with the given stored status, in input order.
pub fn tasks_with_status(tasks: &[Task], status: Status) -> Vec<&Task> {
    tasks.iter().filter(|t| t.status == status).collect()
}

/// All tasks by ascending due date. The sort is stable and undated tasks go last.
pub fn timeline(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|t| t.due_date.unwrap_or(NaiveDate::MAX));
    sorted
}

/// Calendar view: dated tasks grouped per day, days ascending.
pub fn group_by_day(tasks: &[Task]) -> Vec<(NaiveDate, Vec<&Task>)> {
    let mut days: Vec<(NaiveDate, Vec<&Task>)> = Vec::new();
    for t in timeline(tasks) {
        let Some(d) = t.due_date else { continue };
        match days.last_mut() {
            Some((day, list)) if *day == d => list.push(t),
            _ => days.push((d, vec![t])),
        }
    }
    days
}

/// The next `limit` open tasks by due date.
pub fn upcoming(tasks: &[Task], limit: usize) -> Vec<&Task> {
    let mut open: Vec<&Task> = timeline(tasks)
        .into_iter()
        .filter(|t| t.status != Status::Completed)
        .collect();
    open.truncate(limit);
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: u64, priority: Priority, status: Status, due: Option<NaiveDate>, who: &str) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: String::new(),
            assigned_to: who.into(),
            due_date: due,
            created_date: Utc::now(),
            completed_date: None,
            priority,
            status,
            category: String::new(),
            tags: vec![],
            subtasks: vec![],
            comments: vec![],
            notification_sent: false,
        }
    }

    fn day(d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 12, d)
    }

    fn seed() -> Vec<Task> {
        vec![
            task(1, Priority::Critical, Status::Pending, day(1), "John Doe"),
            task(2, Priority::High, Status::Pending, day(30), "Jane Smith"),
            task(3, Priority::Medium, Status::Completed, day(5), "Mike Johnson"),
            task(4, Priority::Low, Status::Pending, day(2), "Sarah Wilson"),
        ]
    }

    #[test]
    fn test_seed_dashboard_snapshot() {
        let stats = Stats::compute(&seed(), NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.completion_rate, 25);
        assert_eq!(
            stats.by_priority,
            PriorityCounts { critical: 1, high: 1, medium: 0, low: 1 }
        );
    }

    #[test]
    fn test_status_counts_sum_to_len() {
        let mut tasks = seed();
        tasks.push(task(5, Priority::Low, Status::Overdue, None, "x"));
        tasks.push(task(6, Priority::Low, Status::InProgress, None, "x"));
        assert_eq!(status_counts(&tasks).total(), tasks.len());
        assert_eq!(status_counts(&[]).total(), 0);
    }

    #[test]
    fn test_completion_rate_guards_zero_and_rounds() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 8), 13);
    }

    #[test]
    fn test_high_priority_includes_completed_but_distribution_does_not() {
        let tasks = vec![
            task(1, Priority::High, Status::Completed, None, "a"),
            task(2, Priority::Critical, Status::Pending, None, "a"),
        ];
        assert_eq!(high_priority_count(&tasks), 2);
        assert_eq!(priority_distribution(&tasks).high, 0);
        assert_eq!(priority_distribution(&tasks).critical, 1);
    }

    #[test]
    fn test_overdue_notions_disagree() {
        let today = Local::now().date_naive();
        let t = task(1, Priority::Low, Status::Pending, today.pred_opt(), "a");
        assert!(!is_overdue_by_status(&t));
        assert!(is_overdue_by_due_date(&t, today));
        let tasks = vec![t];
        assert_eq!(overdue_by_status_count(&tasks), 0);
        assert_eq!(overdue_by_due_date_count(&tasks, today), 1);
        assert_eq!(Stats::compute(&tasks, today).overdue, 0);
    }

    #[test]
    fn test_due_today_ignores_status() {
        let today = day(3).unwrap();
        let tasks = vec![
            task(1, Priority::Low, Status::Completed, day(3), "a"),
            task(2, Priority::Low, Status::Pending, day(3), "a"),
            task(3, Priority::Low, Status::Pending, day(4), "a"),
        ];
        assert_eq!(Stats::compute(&tasks, today).due_today, 2);
    }

    #[test]
    fn test_notification_count_uses_due_dates() {
        let now = Local::now();
        let today = now.date_naive();
        let tasks = vec![
            task(1, Priority::Low, Status::Pending, today.pred_opt(), "a"),
            task(2, Priority::Low, Status::Pending, today.succ_opt(), "a"),
            task(3, Priority::Low, Status::Completed, today.pred_opt(), "a"),
            task(4, Priority::Low, Status::Overdue, Some(today + Duration::days(30)), "a"),
            task(5, Priority::Low, Status::Pending, None, "a"),
        ];
        assert_eq!(notification_count(&tasks, now, 48), 2);
        assert_eq!(notification_count(&tasks, now, 0), 1);
    }

    #[test]
    fn test_group_by_person_first_seen_order() {
        let tasks = vec![
            task(1, Priority::Low, Status::Completed, None, "Zoe"),
            task(2, Priority::Low, Status::Pending, None, "Adam"),
            task(3, Priority::Low, Status::Pending, None, "Zoe"),
        ];
        let groups = group_by_person(&tasks);
        assert_eq!(groups.iter().map(|g| g.person).collect::<Vec<_>>(), vec!["Zoe", "Adam"]);
        assert_eq!((groups[0].completed(), groups[0].total()), (1, 2));
        assert_eq!(groups[0].completion_rate(), 50);
        assert_eq!(groups[1].tasks[0].id, 2);
    }

    #[test]
    fn test_timeline_is_stable_and_puts_undated_last() {
        let tasks = vec![
            task(1, Priority::Low, Status::Pending, day(5), "a"),
            task(2, Priority::Low, Status::Pending, None, "a"),
            task(3, Priority::Low, Status::Pending, day(1), "a"),
            task(4, Priority::Low, Status::Pending, day(5), "a"),
        ];
        let ids: Vec<u64> = timeline(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_group_by_day_and_upcoming() {
        let tasks = vec![
            task(1, Priority::Low, Status::Pending, day(5), "a"),
            task(2, Priority::Low, Status::Completed, day(1), "a"),
            task(3, Priority::Low, Status::Pending, day(5), "a"),
            task(4, Priority::Low, Status::Pending, None, "a"),
        ];
        let days = group_by_day(&tasks);
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].0, day(5).unwrap());
        assert_eq!(days[1].1.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(upcoming(&tasks, 2).iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
    }
}
