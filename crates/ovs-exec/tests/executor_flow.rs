// executor_flow.rs — End-to-end executor behavior over fixture backends.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::tempdir;

use ovs_edit::{EditBackend, EditError, EditPlanner, EditRequest, WalkContextProvider};
use ovs_events::MemorySink;
use ovs_exec::{ExecError, Executor, TerminalAdapter, ToolOutcome, MAX_RETRIES};
use ovs_plan::{FixtureBackend, PhaseStatus, Planner, TaskStatus};
use ovs_risk::RiskGate;

/// Terminal that records every command and fails the ones containing
/// "fail".
#[derive(Clone, Default)]
struct StubTerminal {
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubTerminal {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TerminalAdapter for StubTerminal {
    fn execute(&self, command: &str, _cwd: &Path) -> ToolOutcome {
        self.calls.lock().unwrap().push(command.to_string());
        if command.contains("fail") {
            ToolOutcome::failed(format!("command '{}' exited 1", command))
        } else {
            ToolOutcome::ok("ok")
        }
    }
}

const TWO_PHASE_PLAN: &str = r#"{
    "reasoning": "build then verify",
    "phases": [
        {
            "name": "Build",
            "description": "produce the artifact",
            "tasks": [
                { "description": "compile", "tool": "terminal", "command": "make build" }
            ]
        },
        {
            "name": "Verify",
            "description": "run the checks",
            "tasks": [
                { "description": "test", "tool": "terminal", "command": "make check" }
            ]
        }
    ]
}"#;

const DOOMED_PLAN: &str = r#"{
    "reasoning": "one phase that cannot work",
    "phases": [
        {
            "name": "Broken",
            "description": "always fails",
            "tasks": [
                { "description": "step", "tool": "terminal", "command": "fail step" }
            ]
        },
        {
            "name": "Unreached",
            "description": "must never start",
            "tasks": [
                { "description": "later", "tool": "terminal", "command": "make later" }
            ]
        }
    ]
}"#;

const FAILING_REPLAN: &str =
    r#"{ "tasks": [ { "description": "retry", "tool": "terminal", "command": "fail again" } ] }"#;

fn executor_with(
    backend: Arc<FixtureBackend>,
    terminal: StubTerminal,
    sink: Arc<MemorySink>,
    root: &Path,
) -> Executor {
    Executor::new(
        Planner::new(Box::new(backend)),
        Arc::new(RiskGate::new()),
        sink,
        root,
    )
    .with_terminal(Box::new(terminal))
}

#[tokio::test]
async fn successful_plan_runs_every_phase_and_completes_once() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(FixtureBackend::new(TWO_PHASE_PLAN));
    let terminal = StubTerminal::default();
    let sink = Arc::new(MemorySink::new());
    let executor = executor_with(
        Arc::clone(&backend),
        terminal.clone(),
        Arc::clone(&sink),
        dir.path(),
    );

    let mut plan = executor.plan_project("ship it").unwrap();
    executor.execute_plan(&mut plan).await.unwrap();

    assert!(plan.phases.iter().all(|p| p.status == PhaseStatus::Completed));
    assert!(plan
        .phases
        .iter()
        .flat_map(|p| &p.tasks)
        .all(|t| t.status == TaskStatus::Completed));
    assert_eq!(terminal.calls(), vec!["make build", "make check"]);

    assert_eq!(sink.count_of("completed"), 1);
    assert_eq!(sink.count_of("progress"), 4); // active + completed per phase
    assert_eq!(backend.replan_calls(), 0);
}

#[tokio::test]
async fn exhausted_phase_aborts_plan_and_skips_later_phases() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(
        FixtureBackend::new(DOOMED_PLAN)
            .with_repeated_replan_response(FAILING_REPLAN, MAX_RETRIES - 1),
    );
    let terminal = StubTerminal::default();
    let sink = Arc::new(MemorySink::new());
    let executor = executor_with(
        Arc::clone(&backend),
        terminal.clone(),
        Arc::clone(&sink),
        dir.path(),
    );

    let mut plan = executor.plan_project("doomed goal").unwrap();
    let err = executor.execute_plan(&mut plan).await.unwrap_err();

    match err {
        ExecError::PhaseFailed {
            phase,
            attempts,
            last_error,
        } => {
            assert_eq!(phase, "Broken");
            assert_eq!(attempts, MAX_RETRIES);
            assert!(last_error.contains("fail again"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Replanned once per non-final attempt.
    assert_eq!(backend.replan_calls(), MAX_RETRIES - 1);
    assert_eq!(sink.count_of("task_error"), MAX_RETRIES);
    assert_eq!(sink.count_of("plan_updated"), MAX_RETRIES - 1);
    assert_eq!(sink.count_of("completed"), 0);

    assert_eq!(plan.phases[0].status, PhaseStatus::Failed);
    assert_eq!(plan.phases[1].status, PhaseStatus::Pending);
    assert!(terminal.calls().iter().all(|c| c != "make later"));
}

#[tokio::test]
async fn replanned_tasks_can_recover_a_failing_phase() {
    let dir = tempdir().unwrap();
    let recovery =
        r#"{ "tasks": [ { "description": "retry", "tool": "terminal", "command": "make retry" } ] }"#;
    let backend = Arc::new(
        FixtureBackend::new(DOOMED_PLAN).with_replan_responses(vec![recovery.to_string()]),
    );
    let terminal = StubTerminal::default();
    let sink = Arc::new(MemorySink::new());
    let executor = executor_with(
        Arc::clone(&backend),
        terminal.clone(),
        Arc::clone(&sink),
        dir.path(),
    );

    let mut plan = executor.plan_project("recoverable goal").unwrap();
    executor.execute_plan(&mut plan).await.unwrap();

    assert_eq!(backend.replan_calls(), 1);
    assert_eq!(plan.phases[0].status, PhaseStatus::Completed);
    assert_eq!(plan.phases[0].tasks.len(), 1);
    assert_eq!(terminal.calls(), vec!["fail step", "make retry", "make later"]);
    assert_eq!(sink.count_of("completed"), 1);
}

#[tokio::test]
async fn malformed_replan_response_aborts_without_more_retries() {
    let dir = tempdir().unwrap();
    let backend = Arc::new(
        FixtureBackend::new(DOOMED_PLAN)
            .with_replan_responses(vec!["not json at all".to_string()]),
    );
    let sink = Arc::new(MemorySink::new());
    let executor = executor_with(
        Arc::clone(&backend),
        StubTerminal::default(),
        Arc::clone(&sink),
        dir.path(),
    );

    let mut plan = executor.plan_project("goal").unwrap();
    let err = executor.execute_plan(&mut plan).await.unwrap_err();

    assert!(matches!(
        err,
        ExecError::Plan(ovs_plan::PlanError::InvalidResponse { .. })
    ));
    assert_eq!(backend.replan_calls(), 1);
    assert_eq!(sink.count_of("completed"), 0);
}

/// Edit backend that always proposes creating one file.
struct CreatingEditBackend;

impl EditBackend for CreatingEditBackend {
    fn generate_edit(&self, request: &EditRequest) -> Result<String, EditError> {
        assert!(!request.change_spec.is_empty());
        Ok(r#"{
            "reasoning": "add the module",
            "files": [
                { "path": "src/health.rs", "action": "create", "content": "pub fn ok() {}\n" }
            ]
        }"#
        .to_string())
    }
}

#[tokio::test]
async fn file_edit_task_writes_files_and_emits_file_changes() {
    let dir = tempdir().unwrap();
    let plan_response = r#"{
        "reasoning": "one edit",
        "phases": [
            {
                "name": "Edit",
                "description": "apply the change",
                "tasks": [
                    { "description": "add a health module", "tool": "file_edit" }
                ]
            }
        ]
    }"#;

    let sink = Arc::new(MemorySink::new());
    let executor = Executor::new(
        Planner::new(Box::new(FixtureBackend::new(plan_response))),
        Arc::new(RiskGate::new()),
        sink.clone(),
        dir.path(),
    )
    .with_edit_planner(EditPlanner::new(
        Box::new(WalkContextProvider::default()),
        Box::new(CreatingEditBackend),
    ));

    let mut plan = executor.plan_project("add health check").unwrap();
    executor.execute_plan(&mut plan).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("src/health.rs")).unwrap(),
        "pub fn ok() {}\n"
    );
    assert_eq!(sink.count_of("file_change"), 1);
    assert_eq!(sink.count_of("completed"), 1);
}

/// Edit backend whose proposal wedges the transaction: the first create
/// turns "a" into a directory, so writing "a" itself fails and the
/// rollback cannot remove the directory either.
struct WedgingEditBackend;

impl EditBackend for WedgingEditBackend {
    fn generate_edit(&self, _request: &EditRequest) -> Result<String, EditError> {
        Ok(r#"{
            "reasoning": "conflicting paths",
            "files": [
                { "path": "a/b.txt", "action": "create", "content": "inner" },
                { "path": "a", "action": "create", "content": "outer" }
            ]
        }"#
        .to_string())
    }
}

#[tokio::test]
async fn failed_rollback_aborts_the_plan_without_retry() {
    let dir = tempdir().unwrap();
    let plan_response = r#"{
        "reasoning": "one edit",
        "phases": [
            {
                "name": "Edit",
                "description": "apply the change",
                "tasks": [
                    { "description": "rearrange files", "tool": "file_edit" }
                ]
            }
        ]
    }"#;

    let backend = Arc::new(FixtureBackend::new(plan_response));
    let sink = Arc::new(MemorySink::new());
    let executor = Executor::new(
        Planner::new(Box::new(Arc::clone(&backend))),
        Arc::new(RiskGate::new()),
        sink.clone(),
        dir.path(),
    )
    .with_edit_planner(EditPlanner::new(
        Box::new(WalkContextProvider::default()),
        Box::new(WedgingEditBackend),
    ));

    let mut plan = executor.plan_project("rearrange").unwrap();
    let err = executor.execute_plan(&mut plan).await.unwrap_err();

    // The workspace may be inconsistent, so the phase is not replanned.
    assert!(matches!(
        err,
        ExecError::Transaction {
            source: EditError::RollbackFailed { .. }
        }
    ));
    assert_eq!(backend.replan_calls(), 0);
    assert_eq!(sink.count_of("task_error"), 0);
    assert_eq!(sink.count_of("file_change"), 0);
    assert_eq!(sink.count_of("completed"), 0);
    assert_eq!(plan.phases[0].status, PhaseStatus::Failed);
}

const HIGH_RISK_PLAN: &str = r#"{
    "reasoning": "publish",
    "phases": [
        {
            "name": "Publish",
            "description": "push the branch",
            "tasks": [
                { "description": "push", "tool": "terminal", "command": "git push --force origin main" }
            ]
        }
    ]
}"#;

#[tokio::test(start_paused = true)]
async fn approved_high_risk_command_runs() {
    let dir = tempdir().unwrap();
    let terminal = StubTerminal::default();
    let sink = Arc::new(MemorySink::new());
    let gate = Arc::new(RiskGate::new());
    let executor = Executor::new(
        Planner::new(Box::new(FixtureBackend::new(HIGH_RISK_PLAN))),
        Arc::clone(&gate),
        sink.clone(),
        dir.path(),
    )
    .with_terminal(Box::new(terminal.clone()))
    .with_run_id("run-42");

    let worker = tokio::spawn(async move {
        let mut plan = executor.plan_project("publish").unwrap();
        executor.execute_plan(&mut plan).await
    });

    // Wait for the prompt, then approve it.
    let id = loop {
        if let Some(request) = gate.pending_requests().into_iter().next() {
            break request.id;
        }
        tokio::task::yield_now().await;
    };
    assert!(gate.resolve(id, true));

    worker.await.unwrap().unwrap();
    assert_eq!(terminal.calls(), vec!["git push --force origin main"]);
    assert_eq!(sink.count_of("risk_prompt"), 1);
    assert_eq!(sink.count_of("completed"), 1);
}

#[tokio::test(start_paused = true)]
async fn denied_high_risk_command_never_reaches_the_adapter() {
    let dir = tempdir().unwrap();
    let high_risk_replan = r#"{ "tasks": [ { "description": "push", "tool": "terminal", "command": "git push --force origin main" } ] }"#;
    let backend = Arc::new(
        FixtureBackend::new(HIGH_RISK_PLAN)
            .with_repeated_replan_response(high_risk_replan, MAX_RETRIES - 1),
    );
    let terminal = StubTerminal::default();
    let sink = Arc::new(MemorySink::new());
    // Nobody answers; the paused clock drives each prompt to timeout-deny.
    let gate = Arc::new(RiskGate::with_timeout(Duration::from_millis(50)));
    let executor = Executor::new(
        Planner::new(Box::new(Arc::clone(&backend))),
        gate,
        sink.clone(),
        dir.path(),
    )
    .with_terminal(Box::new(terminal.clone()));

    let mut plan = executor.plan_project("publish").unwrap();
    let err = executor.execute_plan(&mut plan).await.unwrap_err();

    match err {
        ExecError::PhaseFailed {
            attempts,
            last_error,
            ..
        } => {
            assert_eq!(attempts, MAX_RETRIES);
            assert!(last_error.contains("denied by risk gate"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(terminal.calls().is_empty());
    assert_eq!(sink.count_of("risk_prompt"), MAX_RETRIES);
    assert_eq!(backend.replan_calls(), MAX_RETRIES - 1);
}
