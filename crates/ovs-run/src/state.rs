// state.rs — Run lifecycle states and the closed transition table.
//
// The table is intentionally closed: any (from, to) pair not listed is
// invalid. `error` is reachable from every working state and recoverable
// back to `idle` or `planning`. `cancelled` is reachable from every active
// state and re-arms to `idle`; `done` is the only terminal state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle state of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing in flight — ready to accept a goal.
    Idle,

    /// The planner is decomposing the goal into phases.
    Planning,

    /// The executor is driving phase tasks.
    Executing,

    /// Verifying the executed work.
    Testing,

    /// Repairing issues found while testing.
    Fixing,

    /// The run hit an unrecoverable condition (recoverable by re-arming).
    Error,

    /// The run finished successfully. Terminal.
    Done,

    /// The run was cancelled by the operator.
    Cancelled,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Planning => write!(f, "planning"),
            RunState::Executing => write!(f, "executing"),
            RunState::Testing => write!(f, "testing"),
            RunState::Fixing => write!(f, "fixing"),
            RunState::Error => write!(f, "error"),
            RunState::Done => write!(f, "done"),
            RunState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl RunState {
    /// The allowed transition targets from this state.
    ///
    /// This is the single source of truth — `can_transition_to` and
    /// `possible_transitions` both read it.
    pub fn allowed_targets(&self) -> &'static [RunState] {
        use RunState::*;
        match self {
            Idle => &[Planning, Error],
            Planning => &[Executing, Error, Cancelled],
            Executing => &[Testing, Error, Cancelled],
            Testing => &[Fixing, Done, Error, Cancelled],
            Fixing => &[Testing, Done, Error, Cancelled],
            Error => &[Idle, Planning],
            Done => &[Idle],
            Cancelled => &[Idle],
        }
    }

    /// Check whether transitioning from this state to `next` is valid.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        self.allowed_targets().contains(&next)
    }

    /// True while the run is doing work (planning through fixing).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::Planning | RunState::Executing | RunState::Testing | RunState::Fixing
        )
    }
}

/// How the run treats approval checkpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Proceed automatically; only high-risk actions prompt.
    #[default]
    Auto,

    /// An operator is watching; prompts are expected to be answered.
    Supervised,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Auto => write!(f, "auto"),
            RunMode::Supervised => write!(f, "supervised"),
        }
    }
}
