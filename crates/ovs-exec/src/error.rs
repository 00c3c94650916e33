// error.rs — Error types for plan execution.
//
// The executor catches only ToolExecution to drive its bounded retry loop.
// Everything else propagates to the plan-level caller: planning failures,
// unknown tools (deterministic — replanning around them is pointless),
// exhausted phases, and rollback failures.

use thiserror::Error;

use ovs_edit::EditError;
use ovs_plan::PlanError;

/// Errors that can occur while executing a plan.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A task's adapter reported failure (including a denied or timed-out
    /// risk decision). Drives the phase retry/replan loop.
    #[error("task {task_id} failed: {message}")]
    ToolExecution { task_id: String, message: String },

    /// The task names a tool this executor has no adapter for. Fatal for
    /// the phase, not retried.
    #[error("no adapter for tool '{tool}' (task {task_id})")]
    ToolNotFound { task_id: String, tool: String },

    /// Retries exhausted for a phase. Fatal for the entire plan. Carries
    /// the attempt count and the last underlying failure so operators can
    /// tell "never worked" from "worked, then regressed".
    #[error("phase '{phase}' failed after {attempts} attempts: {last_error}")]
    PhaseFailed {
        phase: String,
        attempts: usize,
        last_error: String,
    },

    /// Plan or replan generation failed. Propagates unchanged.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// An edit transaction's rollback failed after a write error. Must
    /// propagate distinctly — the workspace may be inconsistent.
    #[error("transaction failure: {source}")]
    Transaction {
        #[source]
        source: EditError,
    },
}
