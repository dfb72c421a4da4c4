//! Command implementations for the CLI interface.
//!
//! Each handler takes the loaded [`Database`] and, when it mutates, the store
//! to mirror the change into. Handlers print their own output and exit with a
//! non-zero status on failure.

use std::fmt::Display;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::assist::{append_suggestions, Assistant};
use crate::db::*;
use crate::fields::*;
use crate::filter::FilterState;
use crate::report::{report_file_name, spawn_report, write_report, ReportConfig};
use crate::settings::SettingsUpdate;
use crate::stats::*;
use crate::storage::KeyValueStore;
use crate::task::{Task, TaskDraft, TaskUpdate};

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Person the task is assigned to.
        #[arg(long = "assign")]
        assigned_to: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "next fri".
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long, value_enum, default_value_t = Status::Pending)]
        status: Status,
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List tasks with optional filters.
    List {
        /// Case-insensitive search in title and description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Filter by assignee.
        #[arg(long)]
        person: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Only open tasks whose due date has passed.
        #[arg(long)]
        overdue: bool,
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by ID or title.
    View {
        /// Task ID or title to view
        id: String,
    },

    /// Update fields on a task.
    Update {
        /// Task ID or title to update
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long = "assign")]
        assigned_to: Option<String>,
        #[arg(long)]
        due: Option<String>,
        /// Clear due date.
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long)]
        category: Option<String>,
        /// Replace all tags. May be repeated and comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Mark whether the due-date notification was sent.
        #[arg(long)]
        notified: Option<bool>,
    },

    /// Mark a task completed.
    Complete {
        /// Task ID or title to complete
        id: String,
    },

    /// Flip a task between completed and pending.
    Toggle {
        /// Task ID or title to toggle
        id: String,
    },

    /// Delete a task with its subtasks and comments.
    Delete {
        /// Task ID or title to delete
        id: String,
    },

    /// Manage the subtasks of a task.
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },

    /// Add a comment to a task.
    Comment {
        /// Task ID or title
        id: String,
        text: String,
        /// Defaults to the configured user name.
        #[arg(long)]
        author: Option<String>,
    },

    /// Show the dashboard: counts, priority distribution and upcoming deadlines.
    Dashboard,

    /// Show tasks grouped by assignee.
    People,

    /// Show dated tasks grouped by day.
    Calendar,

    /// Show categories with task counts.
    Categories,

    /// Generate the standalone HTML report.
    Report {
        /// Output file. Defaults to taskpro-report-YYYY-MM-DD.html.
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subtitle: Option<String>,
        /// Leave out the status distribution chart.
        #[arg(long)]
        no_charts: bool,
    },

    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Ask the assistant for a description, priority and category.
    Autofill {
        /// Title to base the suggestion on.
        title: String,
        /// Create the task with the suggested details.
        #[arg(long)]
        create: bool,
    },

    /// Ask the assistant to break a task down into subtasks.
    SuggestSubtasks {
        /// Task ID or title
        id: String,
        /// Append the suggestions to the task.
        #[arg(long)]
        apply: bool,
    },

    /// Delete all tasks.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Append a subtask.
    Add {
        /// Task ID or title
        id: String,
        title: String,
        #[arg(long = "assign")]
        assigned_to: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Flip a subtask's completed flag.
    Toggle {
        /// Task ID or title
        id: String,
        subtask: u64,
    },
    /// Remove a subtask.
    Remove {
        /// Task ID or title
        id: String,
        subtask: u64,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        user_name: Option<String>,
        /// Hours before a due date at which notifications start.
        #[arg(long)]
        lead_time: Option<u32>,
        #[arg(long, value_enum)]
        default_view: Option<DefaultView>,
        #[arg(long, value_enum)]
        theme: Option<Theme>,
    },
}

fn fail(context: &str, e: impl Display) -> ! {
    eprintln!("{context}: {e}");
    std::process::exit(1);
}

fn resolve(db: &Database, id: &str) -> u64 {
    match resolve_task_identifier(id, db) {
        Ok(id) => id,
        Err(e) => fail("Error resolving task", e),
    }
}

fn parse_due_or_exit(s: &str) -> NaiveDate {
    parse_due_input(s).unwrap_or_else(|| {
        eprintln!("Unrecognised due date. Use YYYY-MM-DD, 'today', 'tomorrow', 'in Nd', or a weekday.");
        std::process::exit(1);
    })
}

/// Mirror both keys after a mutation.
fn save(db: &Database, store: &dyn KeyValueStore) {
    if let Err(e) = db.save(store) {
        fail("Failed to save", e);
    }
}

/// Add a new task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    db: &mut Database,
    store: &dyn KeyValueStore,
    title: String,
    desc: Option<String>,
    assigned_to: Option<String>,
    due: Option<String>,
    priority: Priority,
    status: Status,
    category: Option<String>,
    tags: Vec<String>,
) {
    let draft = TaskDraft {
        description: desc.unwrap_or_default(),
        assigned_to: assigned_to.unwrap_or_default(),
        due_date: due.as_deref().map(parse_due_or_exit),
        priority,
        status,
        category: category.unwrap_or_default(),
        tags,
        ..TaskDraft::new(title)
    };
    let id = match db.create(draft) {
        Ok(id) => id,
        Err(e) => fail("Could not add task", e),
    };
    save(db, store);
    println!("Added task {id}");
}

/// List tasks with optional filtering and sorting.
#[allow(clippy::too_many_arguments)]
pub fn cmd_list(
    db: &Database,
    search: Option<String>,
    status: Option<Status>,
    priority: Option<Priority>,
    person: Option<String>,
    category: Option<String>,
    overdue: bool,
    sort: SortKey,
    limit: Option<usize>,
) {
    let filter = FilterState {
        search: search.unwrap_or_default(),
        status,
        priority,
        person,
        category,
    };
    let today = Local::now().date_naive();
    let mut rows: Vec<&Task> = filter
        .apply(&db.tasks)
        .into_iter()
        .filter(|t| !overdue || is_overdue_by_due_date(t, today))
        .collect();

    match sort {
        SortKey::Due => rows.sort_by_key(|t| (t.due_date.unwrap_or(NaiveDate::MAX), t.id)),
        SortKey::Priority => rows.sort_by_key(|t| (t.priority.rank(), t.due_date.unwrap_or(NaiveDate::MAX), t.id)),
        SortKey::Id => rows.sort_by_key(|t| t.id),
    }
    if let Some(n) = limit {
        rows.truncate(n);
    }
    if rows.is_empty() {
        println!("No tasks found.");
        return;
    }
    print_table(&rows);
}

/// View detailed information about a specific task.
pub fn cmd_view(db: &Database, id: String) {
    let task_id = resolve(db, &id);
    let Some(task) = db.get(task_id) else {
        fail("Error", format!("task {task_id} not found"));
    };
    let today = Local::now().date_naive();
    let dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Assigned to:  {}", dash(&task.assigned_to));
    println!("Category:     {}", dash(&task.category));
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Tags:         {}", if task.tags.is_empty() { "-".into() } else { task.tags.join(",") });
    println!("Created:      {}", task.created_date.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    if let Some(done) = task.completed_date {
        println!("Completed:    {}", done.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    println!("Notified:     {}", if task.notification_sent { "yes" } else { "no" });
    println!("Description:\n{}\n", dash(&task.description));

    if !task.subtasks.is_empty() {
        println!("Subtasks ({}/{} done):", task.completed_subtasks(), task.subtasks.len());
        for st in &task.subtasks {
            let mark = if st.completed { "x" } else { " " };
            let mut extra = String::new();
            if let Some(who) = &st.assigned_to {
                extra.push_str(&format!(" @{who}"));
            }
            if let Some(d) = st.due_date {
                extra.push_str(&format!(" due {d}"));
            }
            println!("  [{mark}] #{} {}{extra}", st.id, st.title);
        }
    }
    if !task.comments.is_empty() {
        println!("Comments:");
        for c in &task.comments {
            println!("  {} {}: {}", c.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"), c.author, c.text);
        }
    }
}

/// Update an existing task's fields.
#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    db: &mut Database,
    store: &dyn KeyValueStore,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    assigned_to: Option<String>,
    due: Option<String>,
    clear_due: bool,
    priority: Option<Priority>,
    status: Option<Status>,
    category: Option<String>,
    tags: Vec<String>,
    notified: Option<bool>,
) {
    let task_id = resolve(db, &id);
    let mut updates = Vec::new();
    if let Some(t) = title {
        updates.push(TaskUpdate::Title(t));
    }
    if let Some(d) = desc {
        updates.push(TaskUpdate::Description(d));
    }
    if let Some(a) = assigned_to {
        updates.push(TaskUpdate::AssignedTo(a));
    }
    if clear_due {
        updates.push(TaskUpdate::DueDate(None));
    }
    if let Some(ds) = due {
        updates.push(TaskUpdate::DueDate(Some(parse_due_or_exit(&ds))));
    }
    if let Some(p) = priority {
        updates.push(TaskUpdate::Priority(p));
    }
    if let Some(s) = status {
        updates.push(TaskUpdate::Status(s));
    }
    if let Some(c) = category {
        updates.push(TaskUpdate::Category(c));
    }
    if !tags.is_empty() {
        updates.push(TaskUpdate::Tags(tags));
    }
    if let Some(n) = notified {
        updates.push(TaskUpdate::NotificationSent(n));
    }
    if updates.is_empty() {
        println!("Nothing to update.");
        return;
    }
    if let Err(e) = db.update(task_id, &updates) {
        fail("Could not update task", e);
    }
    save(db, store);
    println!("Updated task {task_id}");
}

pub fn cmd_complete(db: &mut Database, store: &dyn KeyValueStore, id: String) {
    let task_id = resolve(db, &id);
    if let Err(e) = db.update(task_id, &[TaskUpdate::Status(Status::Completed)]) {
        fail("Could not complete task", e);
    }
    save(db, store);
    println!("Completed task {task_id}");
}

pub fn cmd_toggle(db: &mut Database, store: &dyn KeyValueStore, id: String) {
    let task_id = resolve(db, &id);
    let status = match db.toggle_status(task_id) {
        Ok(s) => s,
        Err(e) => fail("Could not toggle task", e),
    };
    save(db, store);
    println!("Task {task_id} is now {}", format_status(status));
}

pub fn cmd_delete(db: &mut Database, store: &dyn KeyValueStore, id: String) {
    let task_id = resolve(db, &id);
    if !db.delete(task_id) {
        fail("Error", format!("task {task_id} not found"));
    }
    save(db, store);
    println!("Deleted task {task_id}");
}

/// Handle subtask management commands.
pub fn cmd_subtask(db: &mut Database, store: &dyn KeyValueStore, action: SubtaskAction) {
    match action {
        SubtaskAction::Add { id, title, assigned_to, due } => {
            let task_id = resolve(db, &id);
            let due = due.as_deref().map(parse_due_or_exit);
            match db.add_subtask(task_id, &title, assigned_to, due) {
                Ok(sub) => {
                    save(db, store);
                    println!("Added subtask {sub} to task {task_id}");
                }
                Err(e) => fail("Could not add subtask", e),
            }
        }
        SubtaskAction::Toggle { id, subtask } => {
            let task_id = resolve(db, &id);
            match db.toggle_subtask(task_id, subtask) {
                Ok(done) => {
                    save(db, store);
                    let state = if done { "done" } else { "open" };
                    println!("Subtask {subtask} of task {task_id} is now {state}");
                }
                Err(e) => fail("Could not toggle subtask", e),
            }
        }
        SubtaskAction::Remove { id, subtask } => {
            let task_id = resolve(db, &id);
            if let Err(e) = db.remove_subtask(task_id, subtask) {
                fail("Could not remove subtask", e);
            }
            save(db, store);
            println!("Removed subtask {subtask} from task {task_id}");
        }
    }
}

pub fn cmd_comment(db: &mut Database, store: &dyn KeyValueStore, id: String, text: String, author: Option<String>) {
    let task_id = resolve(db, &id);
    let author = author.unwrap_or_else(|| db.settings.user_name.clone());
    match db.add_comment(task_id, &text, &author) {
        Ok(cid) => {
            save(db, store);
            println!("Added comment {cid} to task {task_id}");
        }
        Err(e) => fail("Could not add comment", e),
    }
}

/// Print the dashboard.
pub fn cmd_dashboard(db: &Database) {
    let now = Local::now();
    let today = now.date_naive();
    let stats = Stats::compute(&db.tasks, today);

    println!("Welcome back, {}", db.settings.user_name);
    println!();
    println!("Total:        {}", stats.total);
    println!("Pending:      {}", stats.pending);
    println!("In progress:  {}", stats.in_progress);
    println!("Completed:    {} ({}%)", stats.completed, stats.completion_rate);
    println!("Overdue:      {}", stats.overdue);
    println!("Due today:    {}", stats.due_today);
    println!("Team members: {}", db.people().len());
    println!("Past due:     {}", overdue_by_due_date_count(&db.tasks, today));
    println!(
        "Notifications: {} (lead time {}h)",
        notification_count(&db.tasks, now, db.settings.notification_lead_time),
        db.settings.notification_lead_time
    );

    println!();
    println!("Open tasks by priority:");
    let open = stats.by_priority.total();
    for p in Priority::ALL {
        let n = stats.by_priority.get(p);
        let pct = if open > 0 { n * 100 / open } else { 0 };
        println!("  {:<9} {:>3} {}", format_priority(p), n, "#".repeat(pct / 5));
    }

    println!();
    println!("Upcoming deadlines:");
    let next = upcoming(&db.tasks, 5);
    if next.is_empty() {
        println!("  No pending tasks");
    }
    for t in next {
        println!(
            "  {:<10} {:<9} {}",
            format_due_relative(t.due_date, today),
            format_priority(t.priority),
            t.title
        );
    }
}

pub fn cmd_people(db: &Database) {
    let groups = group_by_person(&db.tasks);
    if groups.is_empty() {
        println!("No tasks found.");
        return;
    }
    for g in groups {
        let name = if g.person.is_empty() { "(unassigned)" } else { g.person };
        println!("{name} ({}/{} done, {}%)", g.completed(), g.total(), g.completion_rate());
        print_table(&g.tasks);
        println!();
    }
}

pub fn cmd_calendar(db: &Database) {
    let days = group_by_day(&db.tasks);
    if days.is_empty() {
        println!("No dated tasks.");
        return;
    }
    let today = Local::now().date_naive();
    for (day, tasks) in days {
        println!("{} ({})", day.format("%a %Y-%m-%d"), format_due_relative(Some(day), today));
        for t in tasks {
            println!("  #{:<4} {:<12} {}", t.id, format_status(t.status), t.title);
        }
    }
}

pub fn cmd_categories(db: &Database) {
    let categories = db.categories();
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }
    for (category, count) in categories {
        println!("{category} ({count})");
    }
}

/// Generate the report on a worker thread and write it out.
pub fn cmd_report(
    db: &Database,
    mut config: ReportConfig,
    output: Option<PathBuf>,
    title: Option<String>,
    subtitle: Option<String>,
    no_charts: bool,
) {
    if let Some(t) = title {
        config.title = t;
    }
    if let Some(s) = subtitle {
        config.subtitle = s;
    }
    if no_charts {
        config.include_charts = false;
    }
    let handle = spawn_report(db.tasks.clone(), db.settings.clone(), config);
    println!("Generating report...");
    let html = match handle.join() {
        Ok(Ok(html)) => html,
        Ok(Err(e)) => fail("Report generation failed", e),
        Err(_) => fail("Report generation failed", "worker thread panicked"),
    };
    let path = output.unwrap_or_else(|| PathBuf::from(report_file_name(Local::now().date_naive())));
    if let Err(e) = write_report(&path, &html) {
        fail("Failed to write report", e);
    }
    println!("Report written to {}", path.display());
}

/// Handle settings commands.
pub fn cmd_settings(db: &mut Database, store: &dyn KeyValueStore, action: SettingsAction) {
    match action {
        SettingsAction::Show => {
            let s = &db.settings;
            println!("User name:         {}", s.user_name);
            println!("Notification lead: {}h", s.notification_lead_time);
            println!("Default view:      {}", format_view(s.default_view));
            println!("Theme:             {}", format_theme(s.theme));
        }
        SettingsAction::Set { user_name, lead_time, default_view, theme } => {
            let mut updates = Vec::new();
            if let Some(n) = user_name {
                updates.push(SettingsUpdate::UserName(n));
            }
            if let Some(h) = lead_time {
                updates.push(SettingsUpdate::NotificationLeadTime(h));
            }
            if let Some(v) = default_view {
                updates.push(SettingsUpdate::DefaultView(v));
            }
            if let Some(t) = theme {
                updates.push(SettingsUpdate::Theme(t));
            }
            if updates.is_empty() {
                println!("Nothing to change.");
                return;
            }
            if let Err(e) = db.update_settings(&updates) {
                fail("Could not change settings", e);
            }
            save(db, store);
            println!("Settings saved");
        }
    }
}

pub fn cmd_autofill(db: &mut Database, store: &dyn KeyValueStore, assistant: &Assistant, title: String, create: bool) {
    let suggestion = match assistant.autofill(&title) {
        Ok(s) => s,
        Err(e) => fail("Autofill failed", e),
    };
    println!("Description: {}", suggestion.description);
    println!("Priority:    {}", format_priority(suggestion.priority));
    println!("Category:    {}", suggestion.category);
    if !create {
        return;
    }
    let draft = TaskDraft {
        description: suggestion.description,
        priority: suggestion.priority,
        category: suggestion.category,
        ..TaskDraft::new(title)
    };
    match db.create(draft) {
        Ok(id) => {
            save(db, store);
            println!("Added task {id}");
        }
        Err(e) => fail("Could not add task", e),
    }
}

pub fn cmd_suggest_subtasks(
    db: &mut Database,
    store: &dyn KeyValueStore,
    assistant: &Assistant,
    id: String,
    apply: bool,
) {
    let task_id = resolve(db, &id);
    let Some(task) = db.get(task_id) else {
        fail("Error", format!("task {task_id} not found"));
    };
    let suggestions = match assistant.suggest_subtasks(&task.title, &task.description) {
        Ok(s) => s,
        Err(e) => fail("Subtask suggestion failed", e),
    };
    if suggestions.is_empty() {
        println!("No subtasks suggested.");
        return;
    }
    for s in &suggestions {
        println!("  - {} [{}, {}]", s.title, format_priority(s.priority), s.category);
    }
    if !apply {
        return;
    }
    match append_suggestions(db, task_id, &suggestions) {
        Ok(ids) => {
            save(db, store);
            println!("Added {} subtasks to task {task_id}", ids.len());
        }
        Err(e) => fail("Could not add subtasks", e),
    }
}

pub fn cmd_clear(db: &mut Database, store: &dyn KeyValueStore, yes: bool) {
    if !yes {
        eprintln!("Refusing to delete {} tasks without --yes", db.tasks.len());
        std::process::exit(1);
    }
    let n = db.tasks.len();
    db.clear();
    save(db, store);
    println!("Deleted {n} tasks");
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AppSettings;
    use crate::storage::{read_json, MemoryStore, SETTINGS_KEY, TASKS_KEY};

    #[test]
    fn test_mutating_command_writes_both_keys() {
        let store = MemoryStore::new();
        let mut db = Database::default();
        let id = db.create(TaskDraft::new("Hull survey")).unwrap();
        cmd_complete(&mut db, &store, id.to_string());

        let tasks: Vec<Task> = read_json(&store, TASKS_KEY).unwrap().unwrap();
        assert_eq!(tasks[0].status, Status::Completed);
        let settings: Option<AppSettings> = read_json(&store, SETTINGS_KEY).unwrap();
        assert_eq!(settings, Some(db.settings.clone()));
    }
}
