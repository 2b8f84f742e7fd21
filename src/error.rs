// src/error.rs

use thiserror::Error;

/// Errors surfaced at the edges of the planner (config files, report export,
/// consistency checks). Business outcomes such as stockouts are never errors.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid config (field={field}): {message}")]
    InvalidConfig { field: String, message: String },

    #[error("inconsistent order: {0}")]
    Inconsistent(String),
}

impl PlannerError {
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        PlannerError::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
