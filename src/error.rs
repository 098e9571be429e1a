// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("username '{0}' already exists")]
    DuplicateUsername(String),

    /// Unknown user, wrong password and rejected session tokens all surface as this.
    #[error("invalid username or password")]
    AuthFailure,

    #[error("asset index {index} is out of range (portfolio holds {len} assets)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("failed to access {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot {}: {source}", .path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to sign session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl AppError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True when the in-memory change went through but the snapshot write did not.
    pub fn is_persistence(&self) -> bool {
        matches!(self, AppError::Persistence { .. } | AppError::Snapshot { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
