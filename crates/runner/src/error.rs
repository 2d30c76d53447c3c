//! Runner error type.

use thiserror::Error;

/// Errors raised while loading inputs or storing results.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid mission plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid simulator command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Search(#[from] obstacle_search::Error),
}

/// Result alias for the runner.
pub type Result<T> = std::result::Result<T, RunnerError>;
