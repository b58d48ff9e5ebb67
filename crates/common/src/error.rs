//! Error types shared across the LabTrack tools.

use std::path::PathBuf;

use labtrack_marker_model::ModelError;

/// Top-level error type for LabTrack operations.
#[derive(Debug, thiserror::Error)]
pub enum LabtrackError {
    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using LabtrackError.
pub type LabtrackResult<T> = Result<T, LabtrackError>;

impl LabtrackError {
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
