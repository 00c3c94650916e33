// error.rs — Error types for edit planning and transactions.

use thiserror::Error;

/// Errors that can occur while planning or applying a multi-file edit.
#[derive(Debug, Error)]
pub enum EditError {
    /// The edit backend itself failed (transport, refusal, etc.).
    #[error("edit backend error: {0}")]
    Backend(String),

    /// The context provider failed to select candidate files.
    #[error("context provider error: {0}")]
    Context(String),

    /// The backend responded, but the response does not decode into the
    /// edit schema.
    #[error("edit response could not be decoded: {detail}")]
    InvalidResponse { detail: String },

    /// The response described a create/modify without content.
    #[error("no content provided for {action} of {path}")]
    MissingContent { action: String, path: String },

    /// A path tried to escape the workspace root.
    #[error("path traversal rejected: {path}")]
    PathTraversal { path: String },

    /// A file I/O operation failed outside the apply step.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A write failed mid-transaction; the workspace was rolled back to
    /// its pre-transaction state.
    #[error("write failed at {path} (rolled back): {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },

    /// A write failed and the rollback itself also failed. The workspace
    /// may be partially modified — this must never be swallowed.
    #[error("rollback failed at {path} after write error '{write_error}': {rollback_error}")]
    RollbackFailed {
        path: String,
        write_error: String,
        rollback_error: String,
    },
}
