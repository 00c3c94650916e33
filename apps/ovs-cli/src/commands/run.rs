// run.rs — Execute a plan file against a workspace.
//
// The run drives the lifecycle machine alongside the executor:
//   idle → planning (plan file decoded) → executing → testing → done
// with any failure transitioning to error. A snapshot is written to
// .ovs/runs/<run_id>.json at each lifecycle step so `ovs runs` can inspect
// the run afterwards; events are appended to .ovs/events.jsonl and echoed
// to the console.
//
// There is no plan-generation service in offline runs, so a failing phase
// cannot be replanned — the first exhausted task aborts. Plans containing
// file_edit tasks likewise need a configured edit service and are rejected
// by the executor with a tool-not-found error.

use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use ovs_events::{EventDispatcher, EventError, EventSink, LogSink, OrchestratorEvent};
use ovs_exec::{Executor, ProcessTerminal};
use ovs_plan::{Phase, Plan, PlanBackend, PlanError, Planner};
use ovs_risk::RiskGate;
use ovs_run::{RunMode, RunState, RunStateMachine, RunStore};

/// Backend for runs driven from a plan file: there is nothing to ask for
/// a new plan or a replan, so both report a backend error.
struct UnavailableBackend;

impl PlanBackend for UnavailableBackend {
    fn generate_plan(&self, _goal: &str) -> Result<String, PlanError> {
        Err(PlanError::Backend(
            "no plan service configured for this run".to_string(),
        ))
    }

    fn regenerate_phase(&self, phase: &Phase, _failure_reason: &str) -> Result<String, PlanError> {
        Err(PlanError::Backend(format!(
            "no plan service configured; cannot replan phase '{}'",
            phase.name
        )))
    }
}

/// Sink that prints human-readable progress lines.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn emit(&self, event: &OrchestratorEvent) -> Result<(), EventError> {
        match event {
            OrchestratorEvent::Progress {
                phase_name,
                status,
                message,
                ..
            } => println!("[{}] {} — {}", status, phase_name, message),
            OrchestratorEvent::TaskError {
                task_id, message, ..
            } => println!("  task {} failed: {}", task_id, message),
            OrchestratorEvent::FileChange { path, change, .. } => {
                println!("  {} {}", change, path)
            }
            OrchestratorEvent::RiskPrompt { command, risk, .. } => {
                println!("  approval needed [{}]: {}", risk, command)
            }
            OrchestratorEvent::PlanUpdated {
                phase_name, reason, ..
            } => println!("  phase '{}' replanned: {}", phase_name, reason),
            OrchestratorEvent::Completed { goal, phases, .. } => {
                println!("Completed: {} ({} phases)", goal, phases.len())
            }
            OrchestratorEvent::RunStateChanged {
                from_state,
                to_state,
                ..
            } => println!("run: {} -> {}", from_state, to_state),
        }
        Ok(())
    }
}

pub fn execute(
    workspace: &Path,
    plan_file: &Path,
    run_id: Option<&str>,
    yes: bool,
    approval_timeout: u64,
) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(plan_file)
        .with_context(|| format!("reading plan file {}", plan_file.display()))?;
    let mut plan = Plan::from_json(&json)
        .with_context(|| format!("decoding plan file {}", plan_file.display()))?;

    let run_id = run_id
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mode = if yes { RunMode::Auto } else { RunMode::Supervised };

    let ovs_dir = workspace.join(".ovs");
    let store = RunStore::new(ovs_dir.join("runs"))?;
    let mut machine = RunStateMachine::new(mode);

    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_sink(Box::new(LogSink::new(ovs_dir.join("events.jsonl"))));
    dispatcher.add_sink(Box::new(ConsoleSink));
    let events: Arc<dyn EventSink> = Arc::new(dispatcher);

    step(
        &mut machine,
        &store,
        events.as_ref(),
        RunState::Planning,
        Some("plan file loaded"),
        Some(run_id.as_str()),
    )?;

    println!("Run {} — goal: {}", run_id, plan.goal);

    step(&mut machine, &store, events.as_ref(), RunState::Executing, None, None)?;

    let gate = Arc::new(RiskGate::with_timeout(Duration::from_secs(approval_timeout)));
    let executor = Executor::new(
        Planner::new(Box::new(UnavailableBackend)),
        Arc::clone(&gate),
        Arc::clone(&events),
        workspace,
    )
    .with_terminal(Box::new(ProcessTerminal::new()))
    .with_run_id(run_id.as_str());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;

    let stop = Arc::new(AtomicBool::new(false));
    let result = runtime.block_on(async {
        let answerer = spawn_answerer(Arc::clone(&gate), Arc::clone(&stop), yes);
        let result = executor.execute_plan(&mut plan).await;
        stop.store(true, Ordering::Relaxed);
        answerer.abort();
        gate.shutdown();
        result
    });
    // The interactive answerer may still be parked on stdin; don't wait for it.
    runtime.shutdown_background();

    match result {
        Ok(()) => {
            step(
                &mut machine,
                &store,
                events.as_ref(),
                RunState::Testing,
                Some("verifying phase results"),
                None,
            )?;
            step(&mut machine, &store, events.as_ref(), RunState::Done, None, None)?;
            println!("Run {} finished.", run_id);
            Ok(())
        }
        Err(e) => {
            let failed_step = machine.current_phase();
            machine.update_context(ovs_run::ContextUpdate {
                failed_step: Some(failed_step),
                ..Default::default()
            });
            let reason = e.to_string();
            step(
                &mut machine,
                &store,
                events.as_ref(),
                RunState::Error,
                Some(&reason),
                None,
            )?;
            Err(e).with_context(|| format!("run {} failed", run_id))
        }
    }
}

/// Transition the lifecycle machine, notify sinks, and persist a snapshot.
fn step(
    machine: &mut RunStateMachine,
    store: &RunStore,
    events: &dyn EventSink,
    target: RunState,
    reason: Option<&str>,
    run_id: Option<&str>,
) -> anyhow::Result<()> {
    let from = machine.current_state();
    machine.transition(target, reason, run_id)?;
    let run_id = machine.context().run_id.clone().unwrap_or_default();
    let _ = events.emit(&OrchestratorEvent::run_state_changed(&run_id, from, target));
    store.save(machine)?;
    Ok(())
}

/// Answer risk prompts while the executor runs.
///
/// With `--yes` every prompt is approved immediately; otherwise the user is
/// asked on stdin per prompt.
fn spawn_answerer(
    gate: Arc<RiskGate>,
    stop: Arc<AtomicBool>,
    yes: bool,
) -> tokio::task::JoinHandle<()> {
    if yes {
        tokio::spawn(async move {
            while !stop.load(Ordering::Relaxed) {
                for request in gate.pending_requests() {
                    tracing::info!(command = %request.command, "auto-approving high-risk command");
                    gate.resolve(request.id, true);
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
    } else {
        tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            while !stop.load(Ordering::Relaxed) {
                for request in gate.pending_requests() {
                    println!(
                        "Allow high-risk command '{}' in {}? [y/N]",
                        request.command, request.cwd
                    );
                    let mut line = String::new();
                    let allow = stdin
                        .lock()
                        .read_line(&mut line)
                        .map(|_| line.trim().eq_ignore_ascii_case("y"))
                        .unwrap_or(false);
                    gate.resolve(request.id, allow);
                }
                std::thread::sleep(Duration::from_millis(200));
            }
        })
    }
}
