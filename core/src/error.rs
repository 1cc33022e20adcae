//! Kernel error taxonomy.
//!
//! Path validation and lifecycle rejections are resolved locally as logged
//! no-ops; these variants are what callers see in the returned `Result`.

use thiserror::Error;

use crate::task::TaskStatus;

/// Everything a kernel operation can return as an error.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Malformed global path (empty, missing `^`, or containing whitespace).
    #[error("invalid path '{path}'")]
    Validation { path: String },

    /// Reference to a task or archive id that does not exist.
    #[error("task '{id}' not found")]
    NotFound { id: String },

    /// The id already has a sealed archive record; archive records are
    /// never rewritten.
    #[error("task '{id}' is already sealed in the archive")]
    Archived { id: String },

    /// Status change outside the lifecycle table.
    #[error("task '{id}': transition {from} -> {to} not allowed")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KernelError {
    /// Build a `Validation` for a rejected path.
    pub fn validation(path: &str) -> Self {
        KernelError::Validation {
            path: path.to_string(),
        }
    }

    /// Build a `NotFound` for a task or archive id.
    pub fn not_found(id: &str) -> Self {
        KernelError::NotFound { id: id.to_string() }
    }

    /// Build an `Archived` for an id that is already sealed.
    pub fn archived(id: &str) -> Self {
        KernelError::Archived { id: id.to_string() }
    }
}
