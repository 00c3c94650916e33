// event.rs — The orchestration event model.
//
// Overseer emits events at key points of a run. Sinks subscribe to these
// events; the core treats delivery as fire-and-forget.
//
// Event hooks covered:
//   Execution: progress per phase, task errors, plan revisions, completion
//   Files: one file_change per path touched by a committed edit transaction
//   Approval: risk_prompt carrying the pending request for an external UI
//   Lifecycle: run state transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a file in a committed edit transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileChangeKind {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for FileChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileChangeKind::Created => write!(f, "created"),
            FileChangeKind::Updated => write!(f, "updated"),
            FileChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// Final status of one phase, reported in the completion event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseSummary {
    pub name: String,
    pub status: String,
}

/// Events emitted by the orchestration core.
///
/// These are the stable types that sinks and external surfaces can depend
/// on. Statuses and risk levels are carried as their snake_case string
/// forms so this crate stays free of sibling dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// A phase changed status (activated, completed, failed).
    Progress {
        phase_id: String,
        phase_name: String,
        status: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A task failed inside a phase.
    TaskError {
        phase_id: String,
        task_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A file was created, updated, or deleted by a committed transaction.
    FileChange {
        path: String,
        change: FileChangeKind,
        timestamp: DateTime<Utc>,
    },

    /// A high-risk action is waiting for an allow/deny decision.
    ///
    /// The decision comes back later through the risk gate, keyed by
    /// `request_id` — this event only carries the prompt outward.
    RiskPrompt {
        request_id: Uuid,
        tool: String,
        command: String,
        cwd: String,
        risk: String,
        created_at: DateTime<Utc>,
    },

    /// A failed phase's task list was regenerated.
    PlanUpdated {
        phase_id: String,
        phase_name: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// All phases finished — emitted exactly once per successful run.
    Completed {
        goal: String,
        phases: Vec<PhaseSummary>,
        timestamp: DateTime<Utc>,
    },

    /// The run's lifecycle state machine transitioned.
    RunStateChanged {
        run_id: String,
        from_state: String,
        to_state: String,
        timestamp: DateTime<Utc>,
    },
}

impl OrchestratorEvent {
    /// Get the event type name as a string.
    pub fn event_type(&self) -> &str {
        match self {
            OrchestratorEvent::Progress { .. } => "progress",
            OrchestratorEvent::TaskError { .. } => "task_error",
            OrchestratorEvent::FileChange { .. } => "file_change",
            OrchestratorEvent::RiskPrompt { .. } => "risk_prompt",
            OrchestratorEvent::PlanUpdated { .. } => "plan_updated",
            OrchestratorEvent::Completed { .. } => "completed",
            OrchestratorEvent::RunStateChanged { .. } => "run_state_changed",
        }
    }

    /// Helper to create a Progress event.
    pub fn progress(
        phase_id: &str,
        phase_name: &str,
        status: impl std::fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        OrchestratorEvent::Progress {
            phase_id: phase_id.to_string(),
            phase_name: phase_name.to_string(),
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a TaskError event.
    pub fn task_error(phase_id: &str, task_id: &str, message: impl Into<String>) -> Self {
        OrchestratorEvent::TaskError {
            phase_id: phase_id.to_string(),
            task_id: task_id.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a FileChange event.
    pub fn file_change(path: &str, change: FileChangeKind) -> Self {
        OrchestratorEvent::FileChange {
            path: path.to_string(),
            change,
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a PlanUpdated event.
    pub fn plan_updated(phase_id: &str, phase_name: &str, reason: impl Into<String>) -> Self {
        OrchestratorEvent::PlanUpdated {
            phase_id: phase_id.to_string(),
            phase_name: phase_name.to_string(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a Completed event.
    pub fn completed(goal: &str, phases: Vec<PhaseSummary>) -> Self {
        OrchestratorEvent::Completed {
            goal: goal.to_string(),
            phases,
            timestamp: Utc::now(),
        }
    }

    /// Helper to create a RunStateChanged event.
    pub fn run_state_changed(
        run_id: &str,
        from_state: impl std::fmt::Display,
        to_state: impl std::fmt::Display,
    ) -> Self {
        OrchestratorEvent::RunStateChanged {
            run_id: run_id.to_string(),
            from_state: from_state.to_string(),
            to_state: to_state.to_string(),
            timestamp: Utc::now(),
        }
    }
}
