// error.rs — Error types for planning.

use thiserror::Error;

/// Errors that can occur while producing or revising a plan.
///
/// Both variants are fatal for the current planning attempt — the caller
/// decides whether to retry with a fresh request.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan backend itself failed (transport, refusal, etc.).
    #[error("plan backend error: {0}")]
    Backend(String),

    /// The backend responded, but the response does not decode into the
    /// plan schema.
    #[error("plan response could not be decoded: {detail}")]
    InvalidResponse { detail: String },
}
