//! Error types for taskpro.
//!
//! Validation errors are raised before any mutation. Storage and assist
//! errors never bring the session down; command handlers report them and
//! carry on or exit, depending on the command.

use thiserror::Error;

/// Main error type for taskpro operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Task {0} not found")]
    NotFound(u64),

    #[error("Subtask {subtask} not found on task {task}")]
    SubtaskNotFound { task: u64, subtask: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Assistant error: {0}")]
    Assist(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Result type alias for taskpro operations.
pub type Result<T> = std::result::Result<T, Error>;
