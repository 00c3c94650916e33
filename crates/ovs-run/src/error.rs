// error.rs — Error types for the run lifecycle subsystem.

use thiserror::Error;

use crate::state::RunState;

/// Errors that can occur during run lifecycle operations.
#[derive(Debug, Error)]
pub enum RunError {
    /// The requested target state equals the current state.
    #[error("Cannot transition to same state")]
    SameState { state: RunState },

    /// The transition is not in the allowed table.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: RunState, to: RunState },

    /// The machine has no run id in its context (required for persistence).
    #[error("run has no run_id; set one via transition or update_context")]
    MissingRunId,

    /// The requested run was not found in the store.
    #[error("run not found: {0}")]
    NotFound(String),

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize run data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
