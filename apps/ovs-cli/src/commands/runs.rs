// runs.rs — Inspect stored run snapshots.

use std::path::Path;

use clap::Subcommand;

use ovs_run::{RunError, RunSnapshot, RunStore};

#[derive(Subcommand)]
pub enum RunsCommands {
    /// List stored runs, most recent first.
    List,
    /// Show one run's state, context, and transition history.
    Show {
        /// The run identifier.
        run_id: String,
    },
    /// Delete a stored run snapshot.
    Delete {
        /// The run identifier.
        run_id: String,
    },
}

pub fn execute(cmd: &RunsCommands, workspace: &Path) -> anyhow::Result<()> {
    let store = RunStore::new(workspace.join(".ovs/runs"))?;
    match cmd {
        RunsCommands::List => list(&store),
        RunsCommands::Show { run_id } => show(&store, run_id),
        RunsCommands::Delete { run_id } => delete(&store, run_id),
    }
}

fn list(store: &RunStore) -> anyhow::Result<()> {
    let runs = store.list()?;
    if runs.is_empty() {
        println!("No stored runs.");
        return Ok(());
    }

    println!("{:<38} {:<10} {:<10} {:<20}", "RUN", "STATE", "PHASE", "STARTED");
    println!("{}", "-".repeat(80));
    for snapshot in &runs {
        println!("{}", list_line(snapshot));
    }
    Ok(())
}

fn list_line(snapshot: &RunSnapshot) -> String {
    format!(
        "{:<38} {:<10} {:<10} {:<20}",
        snapshot.context.run_id.as_deref().unwrap_or("?"),
        snapshot.current_state,
        snapshot.current_phase,
        snapshot.context.started_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

fn show(store: &RunStore, run_id: &str) -> anyhow::Result<()> {
    let snapshot = store
        .load(run_id)?
        .ok_or_else(|| RunError::NotFound(run_id.to_string()))?;

    println!("Run {}", run_id);
    println!("  state: {}", snapshot.current_state);
    println!("  phase: {}", snapshot.current_phase);
    println!("  mode:  {:?}", snapshot.context.mode);
    if let Some(error) = &snapshot.context.error {
        println!("  error: {}", error);
    }
    if let Some(failed_step) = &snapshot.context.failed_step {
        println!("  failed step: {}", failed_step);
    }
    if let Some(finished_at) = snapshot.context.finished_at {
        println!("  finished: {}", finished_at.format("%Y-%m-%d %H:%M:%S"));
    }

    println!("  history:");
    for record in &snapshot.history {
        let reason = record
            .reason
            .as_deref()
            .map(|r| format!(" ({})", r))
            .unwrap_or_default();
        println!(
            "    {} {} -> {}{}",
            record.timestamp.format("%H:%M:%S"),
            record.from,
            record.to,
            reason
        );
    }
    Ok(())
}

fn delete(store: &RunStore, run_id: &str) -> anyhow::Result<()> {
    if store.delete(run_id)? {
        println!("Deleted run {}.", run_id);
    } else {
        println!("No stored run with id '{}'.", run_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovs_run::{RunMode, RunState, RunStateMachine};
    use tempfile::tempdir;

    fn stored_machine(store: &RunStore, id: &str) -> RunSnapshot {
        let mut m = RunStateMachine::new(RunMode::Auto);
        m.transition(RunState::Planning, None, Some(id)).unwrap();
        m.transition(RunState::Executing, None, None).unwrap();
        store.save(&m).unwrap();
        store.load(id).unwrap().unwrap()
    }

    #[test]
    fn list_line_includes_id_state_and_phase() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path().join("runs")).unwrap();
        let snapshot = stored_machine(&store, "run-7");

        let line = list_line(&snapshot);
        assert!(line.contains("run-7"));
        assert!(line.contains("executing"));
        assert!(line.contains("execute"));
    }

    #[test]
    fn show_missing_run_is_an_error() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path().join("runs")).unwrap();
        assert!(show(&store, "missing").is_err());
    }

    #[test]
    fn delete_reports_missing_without_error() {
        let dir = tempdir().unwrap();
        let store = RunStore::new(dir.path().join("runs")).unwrap();
        stored_machine(&store, "run-1");

        assert!(delete(&store, "run-1").is_ok());
        assert!(store.load("run-1").unwrap().is_none());
        assert!(delete(&store, "run-1").is_ok());
    }
}
