//! # TaskPro - Office Task Management CLI
//!
//! A command-line task manager for a small office team: tasks with priority,
//! status, assignee, category, due date, subtasks and comments, plus a
//! dashboard, per-person and calendar views, and a standalone HTML report.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task
//! taskpro add "Complete project proposal" --assign "John Doe" --priority critical --due "in 4d"
//!
//! # See where things stand
//! taskpro dashboard
//! taskpro list --person "John Doe"
//!
//! # Write the HTML report for today
//! taskpro report
//! ```
//!
//! ## Storage
//!
//! State is mirrored after every change into a key-value store: by default
//! one JSON file per key in `~/.taskpro/`, or a remote blob store with
//! `--remote` (see `taskpro.toml` and `TASKPRO_REMOTE_URL`). A fresh local
//! store starts with a small demo dataset.
//!
//! ## Assistant
//!
//! `taskpro autofill` and `taskpro suggest-subtasks` call a Gemini-style
//! text-completion service when `GEMINI_API_KEY` is set.
//!
//! Logging is off unless `RUST_LOG` is set, e.g. `RUST_LOG=taskpro=debug`.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod assist;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod filter;
#[cfg(test)]
mod http_stub;
pub mod report;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod task;

use cli::Cli;
use cmd::*;
use config::{default_data_dir, Config};
use db::Database;

fn main() {
    // Opt-in via RUST_LOG; an invalid filter leaves logging off.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }
    let config = Config::load(&data_dir);
    let store = match config.open_store(&data_dir, cli.remote) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    debug!(data_dir = %data_dir.display(), store = store.name(), "opening store");

    let mut db = Database::load(store.as_ref(), config.seed(cli.remote));
    let store = store.as_ref();

    match cli.command {
        Commands::Add { title, desc, assigned_to, due, priority, status, category, tags } =>
            cmd_add(&mut db, store, title, desc, assigned_to, due, priority, status, category, tags),

        Commands::List { search, status, priority, person, category, overdue, sort, limit } =>
            cmd_list(&db, search, status, priority, person, category, overdue, sort, limit),

        Commands::View { id } => cmd_view(&db, id),

        Commands::Update {
            id, title, desc, assigned_to, due, clear_due, priority, status, category, tags, notified,
        } => cmd_update(&mut db, store, id, title, desc, assigned_to, due, clear_due, priority,
                        status, category, tags, notified),

        Commands::Complete { id } => cmd_complete(&mut db, store, id),

        Commands::Toggle { id } => cmd_toggle(&mut db, store, id),

        Commands::Delete { id } => cmd_delete(&mut db, store, id),

        Commands::Subtask { action } => cmd_subtask(&mut db, store, action),

        Commands::Comment { id, text, author } => cmd_comment(&mut db, store, id, text, author),

        Commands::Dashboard => cmd_dashboard(&db),

        Commands::People => cmd_people(&db),

        Commands::Calendar => cmd_calendar(&db),

        Commands::Categories => cmd_categories(&db),

        Commands::Report { output, title, subtitle, no_charts } =>
            cmd_report(&db, config.report.clone(), output, title, subtitle, no_charts),

        Commands::Settings { action } => cmd_settings(&mut db, store, action),

        Commands::Autofill { title, create } =>
            cmd_autofill(&mut db, store, &config.assistant(), title, create),

        Commands::SuggestSubtasks { id, apply } =>
            cmd_suggest_subtasks(&mut db, store, &config.assistant(), id, apply),

        Commands::Clear { yes } => cmd_clear(&mut db, store, yes),

        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}
