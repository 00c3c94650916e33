// planner.rs — Planner: goal decomposition over a pluggable backend.
//
// The backend (an LLM service in production, a fixture in tests) returns
// raw text. The planner decodes it strictly into the response schema and
// assigns stable ids. Decoding is all-or-nothing: a malformed response is
// PlanError::InvalidResponse, with the serde detail preserved.

use serde::Deserialize;

use crate::error::PlanError;
use crate::model::{Phase, PhaseStatus, Plan, Task, TaskPayload, TaskStatus};

/// External plan-generation service.
///
/// Implementations return the raw response body; the planner owns decoding.
pub trait PlanBackend: Send + Sync {
    /// Produce a full plan for a goal.
    fn generate_plan(&self, goal: &str) -> Result<String, PlanError>;

    /// Produce a replacement task list for one failed phase.
    fn regenerate_phase(&self, phase: &Phase, failure_reason: &str) -> Result<String, PlanError>;
}

// Shared backends (e.g. a fixture observed by a test after the planner
// takes ownership) can be handed over as an Arc.
impl<T: PlanBackend + ?Sized> PlanBackend for std::sync::Arc<T> {
    fn generate_plan(&self, goal: &str) -> Result<String, PlanError> {
        (**self).generate_plan(goal)
    }

    fn regenerate_phase(&self, phase: &Phase, failure_reason: &str) -> Result<String, PlanError> {
        (**self).regenerate_phase(phase, failure_reason)
    }
}

/// Wire schema of a full plan response.
#[derive(Debug, Deserialize)]
struct PlanResponse {
    reasoning: String,
    phases: Vec<PhaseResponse>,
}

#[derive(Debug, Deserialize)]
struct PhaseResponse {
    name: String,
    description: String,
    tasks: Vec<TaskResponse>,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    description: String,
    #[serde(flatten)]
    payload: TaskPayload,
}

/// Wire schema of a phase-replan response. Only the tasks are regenerated;
/// the phase's identity stays untouched.
#[derive(Debug, Deserialize)]
struct ReplanResponse {
    tasks: Vec<TaskResponse>,
}

/// Decomposes goals into plans and regenerates failed phases.
pub struct Planner {
    backend: Box<dyn PlanBackend>,
}

impl Planner {
    pub fn new(backend: Box<dyn PlanBackend>) -> Self {
        Self { backend }
    }

    /// Produce a plan for `goal`. All phases and tasks start pending.
    pub fn plan_project(&self, goal: &str) -> Result<Plan, PlanError> {
        let raw = self.backend.generate_plan(goal)?;
        let response: PlanResponse = decode(&raw)?;

        if response.phases.is_empty() {
            return Err(PlanError::InvalidResponse {
                detail: "plan has no phases".to_string(),
            });
        }

        let phases = response
            .phases
            .into_iter()
            .enumerate()
            .map(|(i, phase)| {
                let phase_id = format!("phase-{}", i + 1);
                let tasks = materialize_tasks(&phase_id, phase.tasks);
                Phase {
                    id: phase_id,
                    name: phase.name,
                    description: phase.description,
                    status: PhaseStatus::Pending,
                    tasks,
                }
            })
            .collect();

        tracing::info!(goal, "plan generated");

        Ok(Plan {
            goal: goal.to_string(),
            reasoning: response.reasoning,
            phases,
        })
    }

    /// Regenerate only `phase`'s task list given the failure text.
    ///
    /// The returned phase keeps its id, name, and description; its tasks
    /// are the regenerated list, all pending. Sibling phases and the plan's
    /// goal are never touched.
    pub fn replan_phase(&self, phase: &Phase, failure_reason: &str) -> Result<Phase, PlanError> {
        let raw = self.backend.regenerate_phase(phase, failure_reason)?;
        let response: ReplanResponse = decode(&raw)?;

        if response.tasks.is_empty() {
            return Err(PlanError::InvalidResponse {
                detail: format!("replan of '{}' produced no tasks", phase.name),
            });
        }

        tracing::info!(phase = %phase.name, failure_reason, "phase replanned");

        Ok(Phase {
            id: phase.id.clone(),
            name: phase.name.clone(),
            description: phase.description.clone(),
            status: phase.status,
            tasks: materialize_tasks(&phase.id, response.tasks),
        })
    }
}

fn decode<'a, T: Deserialize<'a>>(raw: &'a str) -> Result<T, PlanError> {
    serde_json::from_str(raw).map_err(|e| PlanError::InvalidResponse {
        detail: e.to_string(),
    })
}

fn materialize_tasks(phase_id: &str, tasks: Vec<TaskResponse>) -> Vec<Task> {
    tasks
        .into_iter()
        .enumerate()
        .map(|(i, task)| Task {
            id: format!("{}.{}", phase_id, i + 1),
            description: task.description,
            payload: task.payload,
            status: TaskStatus::Pending,
        })
        .collect()
}
