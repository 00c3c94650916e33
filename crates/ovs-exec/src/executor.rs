// executor.rs — The phase-by-phase plan executor.
//
// A phase is the retry/replan unit. Tasks inside a phase run strictly in
// order; the first task failure counts one attempt against the phase and
// triggers a replan of that phase's task list. Exhausting MAX_RETRIES
// attempts aborts the whole plan. Deterministic failures (unknown tool,
// malformed replan, rollback failure) abort without retrying — replanning
// around them cannot help.

use std::path::PathBuf;
use std::sync::Arc;

use ovs_edit::{execute_multi_file_edit, EditError, EditPlanner, FileAction};
use ovs_events::{EventSink, FileChangeKind, OrchestratorEvent, PhaseSummary};
use ovs_plan::{Phase, PhaseStatus, Plan, Planner, Task, TaskPayload, TaskStatus};
use ovs_risk::{RiskGate, RiskLevel, ToolInvocation};

use crate::error::ExecError;
use crate::tools::TerminalAdapter;

/// Attempts a phase gets before the plan is abandoned. The first attempt
/// runs the original task list; each later attempt runs a replanned one.
pub const MAX_RETRIES: usize = 3;

/// Drives a [`Plan`] to completion against one workspace.
///
/// Adapters are optional at construction; a task whose tool has no wired
/// adapter fails the phase with [`ExecError::ToolNotFound`].
pub struct Executor {
    planner: Planner,
    gate: Arc<RiskGate>,
    events: Arc<dyn EventSink>,
    workspace_root: PathBuf,
    terminal: Option<Box<dyn TerminalAdapter>>,
    edit_planner: Option<EditPlanner>,
    run_id: Option<String>,
}

impl Executor {
    pub fn new(
        planner: Planner,
        gate: Arc<RiskGate>,
        events: Arc<dyn EventSink>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            planner,
            gate,
            events,
            workspace_root: workspace_root.into(),
            terminal: None,
            edit_planner: None,
            run_id: None,
        }
    }

    pub fn with_terminal(mut self, terminal: Box<dyn TerminalAdapter>) -> Self {
        self.terminal = Some(terminal);
        self
    }

    pub fn with_edit_planner(mut self, edit_planner: EditPlanner) -> Self {
        self.edit_planner = Some(edit_planner);
        self
    }

    /// Tag risk prompts with a run id so cancelling that run force-denies
    /// its pending approvals.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Produce a fresh plan for `goal` through the wired planner.
    pub fn plan_project(&self, goal: &str) -> Result<Plan, ExecError> {
        Ok(self.planner.plan_project(goal)?)
    }

    /// Execute every phase of `plan` in order, mutating statuses in place.
    ///
    /// Emits exactly one `completed` event on success. Any phase abort
    /// propagates immediately; later phases are never touched.
    pub async fn execute_plan(&self, plan: &mut Plan) -> Result<(), ExecError> {
        tracing::info!(goal = %plan.goal, phases = plan.phases.len(), "plan execution started");

        for i in 0..plan.phases.len() {
            self.execute_phase(&mut plan.phases[i]).await?;
        }

        let summaries = plan
            .phases
            .iter()
            .map(|p| PhaseSummary {
                name: p.name.clone(),
                status: p.status.to_string(),
            })
            .collect();
        self.emit(OrchestratorEvent::completed(&plan.goal, summaries));

        tracing::info!(goal = %plan.goal, "plan execution completed");
        Ok(())
    }

    /// Run one phase through the bounded retry/replan loop.
    async fn execute_phase(&self, phase: &mut Phase) -> Result<(), ExecError> {
        phase.status = PhaseStatus::Active;
        self.emit(OrchestratorEvent::progress(
            &phase.id,
            &phase.name,
            PhaseStatus::Active,
            "phase started",
        ));

        let mut attempts = 0;
        loop {
            match self.run_tasks(phase).await {
                Ok(()) => {
                    phase.status = PhaseStatus::Completed;
                    self.emit(OrchestratorEvent::progress(
                        &phase.id,
                        &phase.name,
                        PhaseStatus::Completed,
                        "phase completed",
                    ));
                    return Ok(());
                }
                Err(ExecError::ToolExecution { task_id, message }) => {
                    attempts += 1;
                    self.emit(OrchestratorEvent::task_error(&phase.id, &task_id, &message));

                    if attempts >= MAX_RETRIES {
                        phase.status = PhaseStatus::Failed;
                        self.emit(OrchestratorEvent::progress(
                            &phase.id,
                            &phase.name,
                            PhaseStatus::Failed,
                            "retries exhausted",
                        ));
                        return Err(ExecError::PhaseFailed {
                            phase: phase.name.clone(),
                            attempts,
                            last_error: message,
                        });
                    }

                    tracing::warn!(
                        phase = %phase.name,
                        attempts,
                        "task failed, replanning phase: {}",
                        message
                    );
                    let replanned = self.planner.replan_phase(phase, &message)?;
                    phase.tasks = replanned.tasks;
                    phase.reset_tasks();
                    self.emit(OrchestratorEvent::plan_updated(&phase.id, &phase.name, &message));
                }
                Err(other) => {
                    phase.status = PhaseStatus::Failed;
                    self.emit(OrchestratorEvent::progress(
                        &phase.id,
                        &phase.name,
                        PhaseStatus::Failed,
                        other.to_string(),
                    ));
                    return Err(other);
                }
            }
        }
    }

    /// Run the phase's unfinished tasks in order; stop at the first failure.
    /// Tasks completed in an earlier attempt stay completed.
    async fn run_tasks(&self, phase: &mut Phase) -> Result<(), ExecError> {
        for task in &mut phase.tasks {
            if task.status == TaskStatus::Completed {
                continue;
            }
            task.status = TaskStatus::Running;
            tracing::info!(task = %task.id, tool = task.payload.tool(), "task started");

            if let Err(e) = self.execute_task(task).await {
                task.status = TaskStatus::Failed;
                return Err(e);
            }
            task.status = TaskStatus::Completed;
        }
        Ok(())
    }

    /// Dispatch one task to its tool adapter.
    pub async fn execute_task(&self, task: &Task) -> Result<(), ExecError> {
        match &task.payload {
            TaskPayload::Terminal { command } => self.run_terminal(task, command).await,
            TaskPayload::FileEdit { description } => {
                // The payload's change spec wins; an empty one falls back to
                // the task description.
                let change_spec = if description.is_empty() {
                    &task.description
                } else {
                    description
                };
                self.run_file_edit(task, change_spec)
            }
        }
    }

    async fn run_terminal(&self, task: &Task, command: &str) -> Result<(), ExecError> {
        let adapter = self.terminal.as_deref().ok_or_else(|| ExecError::ToolNotFound {
            task_id: task.id.clone(),
            tool: task.payload.tool().to_string(),
        })?;

        let invocation = ToolInvocation {
            tool: task.payload.tool().to_string(),
            command: command.to_string(),
            cwd: self.workspace_root.display().to_string(),
        };

        // Only high risk suspends for approval; low and medium run through.
        if self.gate.classify(&invocation) == RiskLevel::High {
            let allowed = self
                .gate
                .request_approval(&invocation, self.run_id.as_deref(), self.events.as_ref())
                .await;
            if !allowed {
                return Err(ExecError::ToolExecution {
                    task_id: task.id.clone(),
                    message: format!("denied by risk gate: {}", command),
                });
            }
        }

        let outcome = adapter.execute(command, &self.workspace_root);
        if outcome.success {
            Ok(())
        } else {
            Err(ExecError::ToolExecution {
                task_id: task.id.clone(),
                message: outcome.failure_message(),
            })
        }
    }

    fn run_file_edit(&self, task: &Task, change_spec: &str) -> Result<(), ExecError> {
        let edit_planner = self
            .edit_planner
            .as_ref()
            .ok_or_else(|| ExecError::ToolNotFound {
                task_id: task.id.clone(),
                tool: task.payload.tool().to_string(),
            })?;

        let plan = edit_planner
            .plan_multi_file_edit(change_spec, &self.workspace_root, &task.id)
            .map_err(|e| ExecError::ToolExecution {
                task_id: task.id.clone(),
                message: e.to_string(),
            })?;

        match execute_multi_file_edit(&plan, &self.workspace_root) {
            Ok(applied) => {
                for change in &applied {
                    self.emit(OrchestratorEvent::file_change(
                        &change.path,
                        change_kind(change.action),
                    ));
                }
                Ok(())
            }
            // The workspace may be inconsistent — never retried.
            Err(e @ EditError::RollbackFailed { .. }) => Err(ExecError::Transaction { source: e }),
            Err(e) => Err(ExecError::ToolExecution {
                task_id: task.id.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Err(e) = self.events.emit(&event) {
            tracing::warn!(event_type = event.event_type(), "event sink error: {}", e);
        }
    }
}

fn change_kind(action: FileAction) -> FileChangeKind {
    match action {
        FileAction::Create => FileChangeKind::Created,
        FileAction::Modify => FileChangeKind::Updated,
        FileAction::Delete => FileChangeKind::Deleted,
    }
}
