//! Errors reported by marker-model operations.

/// Recoverable conditions returned to the immediate caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// A sample with this run id is already stored.
    #[error("Duplicate run id {run_id}")]
    DuplicateKey { run_id: i64 },

    #[error("Index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Snapshot restore failed; the target was left untouched.
    #[error("Snapshot import failed: {message}")]
    Import { message: String },

    /// Two consecutive time values are equal, so no rate can be computed.
    #[error("Zero-length time interval at index {index}")]
    ZeroInterval { index: usize },
}

/// Result type alias using ModelError.
pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    pub fn import(msg: impl Into<String>) -> Self {
        Self::Import {
            message: msg.into(),
        }
    }

    /// Check `index` against `len`, producing `OutOfRange` when it does not fit.
    pub fn check_index(index: usize, len: usize) -> ModelResult<()> {
        if index < len {
            Ok(())
        } else {
            Err(Self::OutOfRange { index, len })
        }
    }
}
