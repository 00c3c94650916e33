// model.rs — Plan, Phase, Task, and the tagged task payload.
//
// A Plan is produced once per goal. Its `goal` and `reasoning` never change
// after creation; only a failed Phase's `tasks` array may be replaced
// wholesale by replanning. Phase/Task statuses are monotonic within one
// execution attempt: pending → running/active → (completed | failed).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a single task within one execution attempt.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Status of a phase as a retry/replan unit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Failed,
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseStatus::Pending => write!(f, "pending"),
            PhaseStatus::Active => write!(f, "active"),
            PhaseStatus::Completed => write!(f, "completed"),
            PhaseStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Tool-specific task input, discriminated by the `tool` tag.
///
/// Every dispatch site matches this exhaustively — adding a variant is a
/// compile error at each executor until handled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum TaskPayload {
    /// Run a shell command through the terminal adapter.
    Terminal { command: String },

    /// Apply a multi-file edit described in natural language. When the
    /// payload carries no change spec of its own, executors fall back to
    /// the task's description.
    FileEdit {
        #[serde(default)]
        description: String,
    },
}

impl TaskPayload {
    /// The tool tag as a string (for events and errors).
    pub fn tool(&self) -> &str {
        match self {
            TaskPayload::Terminal { .. } => "terminal",
            TaskPayload::FileEdit { .. } => "file_edit",
        }
    }
}

/// A single unit of work bound to exactly one tool adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub description: String,
    #[serde(flatten)]
    pub payload: TaskPayload,
    #[serde(default)]
    pub status: TaskStatus,
}

/// A named, ordered group of tasks treated as one retry/replan unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: PhaseStatus,
    pub tasks: Vec<Task>,
}

impl Phase {
    /// Reset every task to pending. Used when a replanned task list
    /// replaces the old one and the phase restarts from the top.
    pub fn reset_tasks(&mut self) {
        for task in &mut self.tasks {
            task.status = TaskStatus::Pending;
        }
    }
}

/// Ordered set of phases produced for one goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plan {
    /// The goal this plan was produced for. Never changes after creation.
    pub goal: String,

    /// The planner's reasoning. Never changes after creation.
    pub reasoning: String,

    pub phases: Vec<Phase>,
}

impl Plan {
    /// Decode a plan from its JSON representation (e.g., a plan file).
    /// Statuses default to pending when absent.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
