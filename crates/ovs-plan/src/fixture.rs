// fixture.rs — Canned plan backend for tests and offline runs.
//
// Serves a fixed plan response and a queue of replan responses. When the
// queue runs dry, replanning reports a backend error — tests use this to
// drive the executor's retry loop to exhaustion deterministically.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::PlanError;
use crate::model::Phase;
use crate::planner::PlanBackend;

/// A [`PlanBackend`] that replays canned responses.
pub struct FixtureBackend {
    plan_response: String,
    replan_responses: Mutex<VecDeque<String>>,
    /// How many times `regenerate_phase` was called (for assertions).
    replan_calls: Mutex<usize>,
}

impl FixtureBackend {
    pub fn new(plan_response: impl Into<String>) -> Self {
        Self {
            plan_response: plan_response.into(),
            replan_responses: Mutex::new(VecDeque::new()),
            replan_calls: Mutex::new(0),
        }
    }

    /// Queue responses for successive `regenerate_phase` calls.
    pub fn with_replan_responses(self, responses: Vec<String>) -> Self {
        *self.replan_responses.lock().expect("fixture poisoned") = responses.into();
        self
    }

    /// Queue the same replan response for `n` successive calls.
    pub fn with_repeated_replan_response(self, response: &str, n: usize) -> Self {
        let responses = std::iter::repeat_with(|| response.to_string())
            .take(n)
            .collect::<Vec<_>>();
        self.with_replan_responses(responses)
    }

    /// Number of `regenerate_phase` calls served so far.
    pub fn replan_calls(&self) -> usize {
        *self.replan_calls.lock().expect("fixture poisoned")
    }
}

impl PlanBackend for FixtureBackend {
    fn generate_plan(&self, _goal: &str) -> Result<String, PlanError> {
        Ok(self.plan_response.clone())
    }

    fn regenerate_phase(&self, phase: &Phase, _failure_reason: &str) -> Result<String, PlanError> {
        *self.replan_calls.lock().expect("fixture poisoned") += 1;
        self.replan_responses
            .lock()
            .expect("fixture poisoned")
            .pop_front()
            .ok_or_else(|| {
                PlanError::Backend(format!(
                    "fixture has no replan response left for phase '{}'",
                    phase.name
                ))
            })
    }
}
