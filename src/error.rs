use thiserror::Error;

use crate::data::record::Field;

/// Errors surfaced by the grid core.
///
/// None of these are fatal: the engine always degrades to a consistent
/// empty or clamped state before handing one back to the caller.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Failed to load dataset from {source_name}: {reason}")]
    LoadFailure { source_name: String, reason: String },

    #[error("Edit target is stale: the view was rebuilt while editing")]
    EditTargetStale,

    #[error("Invalid windowing input: {0}")]
    InvalidRange(String),

    #[error("Invalid value {value:?} for column {field}: {reason}")]
    InvalidEditValue {
        field: Field,
        value: String,
        reason: String,
    },

    #[error("Column {0} is read-only")]
    ReadOnlyField(Field),

    #[error("Unknown column: {0}")]
    UnknownField(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GridError {
    pub fn load_failure(source_name: impl Into<String>, reason: impl ToString) -> Self {
        GridError::LoadFailure {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
