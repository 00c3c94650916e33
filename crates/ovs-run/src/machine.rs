// machine.rs — RunStateMachine: validates and records lifecycle transitions.
//
// One machine is created per run and owned by that run's executor for the
// whole duration. Concurrent callers must serialize through the owner —
// the machine itself is a plain single-writer value.
//
// Invariants enforced here:
// - history is an unbroken path: each record's `from` equals the previous
//   record's `to` (or the initial state for the first record)
// - context.error is Some exactly while the machine sits in `error`
// - finished_at is stamped only the first time `done` is entered

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RunError;
use crate::state::{RunMode, RunState};

/// One recorded transition. History is append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionRecord {
    pub from: RunState,
    pub to: RunState,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Mutable context carried alongside the state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunContext {
    /// Identifier of the run, once assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Approval posture for this run.
    pub mode: RunMode,

    /// Mirror of the machine's current state, kept in sync by `transition`.
    pub state: RunState,

    /// Which step failed, for runs that entered `error` or were re-armed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,

    pub started_at: DateTime<Utc>,

    /// Stamped the first time the run reaches `done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// File currently being worked on, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,

    /// Line within `current_file`, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Coarse progress indicator, 0–100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,

    /// Failure text. Some exactly while the state is `error`; any
    /// successful transition to a non-error state clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A shallow-merge update for [`RunContext`].
///
/// Only the fields that are `Some` are applied. State, error, and the
/// timestamps are owned by `transition` and cannot be set this way.
#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    pub run_id: Option<String>,
    pub mode: Option<RunMode>,
    pub failed_step: Option<String>,
    pub current_file: Option<String>,
    pub line: Option<u32>,
    pub progress: Option<u8>,
}

/// Lossless serialized form of a [`RunStateMachine`].
///
/// `current_phase` is derived from the state at snapshot time and is kept
/// in the JSON for external consumers; `restore` recomputes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub current_state: RunState,
    pub current_phase: String,
    pub context: RunContext,
    pub history: Vec<TransitionRecord>,
}

/// Validates and records lifecycle transitions for one run.
#[derive(Debug, Clone)]
pub struct RunStateMachine {
    current: RunState,
    context: RunContext,
    history: Vec<TransitionRecord>,
}

impl RunStateMachine {
    /// Create a machine in `idle` with the given approval mode.
    pub fn new(mode: RunMode) -> Self {
        Self {
            current: RunState::Idle,
            context: RunContext {
                run_id: None,
                mode,
                state: RunState::Idle,
                failed_step: None,
                started_at: Utc::now(),
                finished_at: None,
                current_file: None,
                line: None,
                progress: None,
                error: None,
            },
            history: Vec::new(),
        }
    }

    /// Attempt a transition to `target`.
    ///
    /// On success: appends a history record, mirrors the state into the
    /// context, stores `run_id` if provided, sets `context.error` to the
    /// reason when entering `error` (clears it otherwise), and stamps
    /// `finished_at` the first time `done` is entered.
    pub fn transition(
        &mut self,
        target: RunState,
        reason: Option<&str>,
        run_id: Option<&str>,
    ) -> Result<(), RunError> {
        if target == self.current {
            return Err(RunError::SameState { state: target });
        }
        if !self.current.can_transition_to(target) {
            return Err(RunError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }

        let now = Utc::now();
        self.history.push(TransitionRecord {
            from: self.current,
            to: target,
            timestamp: now,
            reason: reason.map(str::to_string),
        });

        tracing::debug!(from = %self.current, to = %target, "run transition");

        self.current = target;
        self.context.state = target;
        if let Some(id) = run_id {
            self.context.run_id = Some(id.to_string());
        }
        if target == RunState::Error {
            self.context.error = reason.map(str::to_string);
        } else {
            self.context.error = None;
        }
        if target == RunState::Done && self.context.finished_at.is_none() {
            self.context.finished_at = Some(now);
        }

        Ok(())
    }

    /// Cancel the run. Valid only from an active state.
    pub fn cancel(&mut self, reason: &str) -> Result<(), RunError> {
        self.transition(RunState::Cancelled, Some(reason), None)
    }

    /// Shallow-merge `update` into the context. Does not change state or
    /// append history.
    pub fn update_context(&mut self, update: ContextUpdate) {
        if let Some(run_id) = update.run_id {
            self.context.run_id = Some(run_id);
        }
        if let Some(mode) = update.mode {
            self.context.mode = mode;
        }
        if let Some(failed_step) = update.failed_step {
            self.context.failed_step = Some(failed_step);
        }
        if let Some(current_file) = update.current_file {
            self.context.current_file = Some(current_file);
        }
        if let Some(line) = update.line {
            self.context.line = Some(line);
        }
        if let Some(progress) = update.progress {
            self.context.progress = Some(progress);
        }
    }

    pub fn current_state(&self) -> RunState {
        self.current
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// True while the run is doing work (planning through fixing).
    pub fn is_active(&self) -> bool {
        self.current.is_active()
    }

    /// True only for `done`. Cancellation is queried separately — see
    /// [`RunStateMachine::is_cancelled`].
    pub fn is_terminal(&self) -> bool {
        self.current == RunState::Done
    }

    pub fn is_error(&self) -> bool {
        self.current == RunState::Error
    }

    pub fn is_cancelled(&self) -> bool {
        self.current == RunState::Cancelled
    }

    /// Allowed targets from the current state, excluding the current state.
    pub fn possible_transitions(&self) -> Vec<RunState> {
        self.current
            .allowed_targets()
            .iter()
            .copied()
            .filter(|s| *s != self.current)
            .collect()
    }

    /// The coarse phase the run is in, for external consumers.
    ///
    /// `error`, `done`, and `cancelled` retain the phase implied by
    /// `failed_step`, defaulting to "execute".
    pub fn current_phase(&self) -> String {
        match self.current {
            RunState::Idle | RunState::Planning => "plan".to_string(),
            RunState::Executing => "execute".to_string(),
            RunState::Testing => "test".to_string(),
            RunState::Fixing => "fix".to_string(),
            RunState::Error | RunState::Done | RunState::Cancelled => self
                .context
                .failed_step
                .clone()
                .unwrap_or_else(|| "execute".to_string()),
        }
    }

    /// Capture a lossless snapshot of the machine.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            current_state: self.current,
            current_phase: self.current_phase(),
            context: self.context.clone(),
            history: self.history.clone(),
        }
    }

    /// Rebuild a machine from a snapshot.
    pub fn restore(snapshot: RunSnapshot) -> Self {
        Self {
            current: snapshot.current_state,
            context: snapshot.context,
            history: snapshot.history,
        }
    }

    /// Serialize the machine to a JSON string.
    pub fn to_json(&self) -> Result<String, RunError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Rebuild a machine from a JSON string produced by `to_json`.
    pub fn from_json(json: &str) -> Result<Self, RunError> {
        let snapshot: RunSnapshot = serde_json::from_str(json)?;
        Ok(Self::restore(snapshot))
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new(RunMode::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(states: &[RunState]) -> RunStateMachine {
        let mut m = RunStateMachine::new(RunMode::Auto);
        for state in states {
            m.transition(*state, None, None).unwrap();
        }
        m
    }

    #[test]
    fn starts_idle_with_empty_history() {
        let m = RunStateMachine::default();
        assert_eq!(m.current_state(), RunState::Idle);
        assert!(m.history().is_empty());
        assert!(m.context().error.is_none());
        assert!(m.context().finished_at.is_none());
    }

    #[test]
    fn same_state_transition_rejected_with_exact_message() {
        let mut m = machine_in(&[RunState::Planning]);
        let err = m.transition(RunState::Planning, None, None).unwrap_err();
        assert_eq!(err.to_string(), "Cannot transition to same state");
        // History unchanged by the failed call.
        assert_eq!(m.history().len(), 1);
    }

    #[test]
    fn invalid_transition_message_names_both_states() {
        let mut m = RunStateMachine::default();
        let err = m.transition(RunState::Testing, None, None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid transition from idle to testing");
    }

    #[test]
    fn history_is_a_reconstructable_path() {
        let m = machine_in(&[
            RunState::Planning,
            RunState::Executing,
            RunState::Testing,
            RunState::Fixing,
            RunState::Testing,
            RunState::Done,
        ]);

        let history = m.history();
        assert_eq!(history[0].from, RunState::Idle);
        for pair in history.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        assert_eq!(history.last().unwrap().to, m.current_state());
    }

    #[test]
    fn error_reason_set_then_cleared_by_next_transition() {
        let mut m = machine_in(&[RunState::Planning, RunState::Executing, RunState::Testing]);

        m.transition(RunState::Fixing, Some("Tests failed"), None)
            .unwrap();
        // Fixing is not the error state, so the reason lands in history only.
        assert!(m.context().error.is_none());
        assert_eq!(
            m.history().last().unwrap().reason.as_deref(),
            Some("Tests failed")
        );

        m.transition(RunState::Error, Some("compile broken"), None)
            .unwrap();
        assert_eq!(m.context().error.as_deref(), Some("compile broken"));
        assert!(m.is_error());

        m.transition(RunState::Planning, None, None).unwrap();
        assert!(m.context().error.is_none());
    }

    #[test]
    fn run_id_stored_when_provided() {
        let mut m = RunStateMachine::default();
        m.transition(RunState::Planning, None, Some("run-42")).unwrap();
        assert_eq!(m.context().run_id.as_deref(), Some("run-42"));

        // Omitting the id on a later transition keeps the old one.
        m.transition(RunState::Executing, None, None).unwrap();
        assert_eq!(m.context().run_id.as_deref(), Some("run-42"));
    }

    #[test]
    fn finished_at_stamped_only_on_first_done() {
        let mut m = machine_in(&[
            RunState::Planning,
            RunState::Executing,
            RunState::Testing,
            RunState::Done,
        ]);
        let first = m.context().finished_at.expect("stamped on done");

        // Re-arm and finish again — the original stamp is retained.
        m.transition(RunState::Idle, None, None).unwrap();
        m.transition(RunState::Planning, None, None).unwrap();
        m.transition(RunState::Executing, None, None).unwrap();
        m.transition(RunState::Testing, None, None).unwrap();
        m.transition(RunState::Done, None, None).unwrap();
        assert_eq!(m.context().finished_at, Some(first));
    }

    #[test]
    fn update_context_merges_without_touching_state_or_history() {
        let mut m = machine_in(&[RunState::Planning]);
        let history_len = m.history().len();

        m.update_context(ContextUpdate {
            current_file: Some("src/lib.rs".to_string()),
            line: Some(10),
            progress: Some(40),
            ..Default::default()
        });

        assert_eq!(m.current_state(), RunState::Planning);
        assert_eq!(m.history().len(), history_len);
        assert_eq!(m.context().current_file.as_deref(), Some("src/lib.rs"));
        assert_eq!(m.context().line, Some(10));
        assert_eq!(m.context().progress, Some(40));

        // A later partial update leaves unset fields alone.
        m.update_context(ContextUpdate {
            progress: Some(60),
            ..Default::default()
        });
        assert_eq!(m.context().current_file.as_deref(), Some("src/lib.rs"));
        assert_eq!(m.context().progress, Some(60));
    }

    #[test]
    fn queries_reflect_state() {
        let mut m = machine_in(&[RunState::Planning, RunState::Executing]);
        assert!(m.is_active());
        assert!(!m.is_terminal());
        assert!(!m.is_error());
        assert!(!m.is_cancelled());

        m.cancel("operator abort").unwrap();
        assert!(m.is_cancelled());
        assert!(!m.is_active());
        assert!(!m.is_terminal());
    }

    #[test]
    fn possible_transitions_excludes_current() {
        let m = machine_in(&[RunState::Planning, RunState::Executing, RunState::Testing]);
        let targets = m.possible_transitions();
        assert!(targets.contains(&RunState::Fixing));
        assert!(targets.contains(&RunState::Done));
        assert!(targets.contains(&RunState::Error));
        assert!(targets.contains(&RunState::Cancelled));
        assert!(!targets.contains(&RunState::Testing));
    }

    #[test]
    fn current_phase_derivation() {
        assert_eq!(RunStateMachine::default().current_phase(), "plan");
        assert_eq!(machine_in(&[RunState::Planning]).current_phase(), "plan");
        assert_eq!(
            machine_in(&[RunState::Planning, RunState::Executing]).current_phase(),
            "execute"
        );
        assert_eq!(
            machine_in(&[RunState::Planning, RunState::Executing, RunState::Testing])
                .current_phase(),
            "test"
        );

        // Error retains the phase implied by failed_step, defaulting to execute.
        let mut m = machine_in(&[RunState::Planning, RunState::Executing]);
        m.transition(RunState::Error, Some("boom"), None).unwrap();
        assert_eq!(m.current_phase(), "execute");

        m.update_context(ContextUpdate {
            failed_step: Some("test".to_string()),
            ..Default::default()
        });
        assert_eq!(m.current_phase(), "test");
    }

    #[test]
    fn json_round_trip_preserves_state_context_history() {
        let mut m = machine_in(&[RunState::Planning, RunState::Executing]);
        m.update_context(ContextUpdate {
            run_id: Some("run-7".to_string()),
            progress: Some(33),
            ..Default::default()
        });
        m.transition(RunState::Error, Some("tool crashed"), None)
            .unwrap();

        let json = m.to_json().unwrap();
        let restored = RunStateMachine::from_json(&json).unwrap();

        assert_eq!(restored.current_state(), m.current_state());
        assert_eq!(restored.context(), m.context());
        assert_eq!(restored.history(), m.history());
        assert_eq!(restored.current_phase(), m.current_phase());
    }
}
