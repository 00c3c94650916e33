// plan.rs — Validate and display plan files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use ovs_plan::{Plan, TaskPayload};

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Decode a plan file and report whether it is well-formed.
    Validate {
        /// Path to the plan JSON file.
        file: PathBuf,
    },
    /// Display a plan file's phases and tasks.
    Show {
        /// Path to the plan JSON file.
        file: PathBuf,
    },
}

pub fn execute(cmd: &PlanCommands) -> anyhow::Result<()> {
    match cmd {
        PlanCommands::Validate { file } => validate(file),
        PlanCommands::Show { file } => show(file),
    }
}

fn load(file: &Path) -> anyhow::Result<Plan> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading plan file {}", file.display()))?;
    Plan::from_json(&json).with_context(|| format!("decoding plan file {}", file.display()))
}

fn validate(file: &Path) -> anyhow::Result<()> {
    let plan = load(file)?;
    let tasks: usize = plan.phases.iter().map(|p| p.tasks.len()).sum();
    println!(
        "{}: valid plan — {} phases, {} tasks",
        file.display(),
        plan.phases.len(),
        tasks
    );
    Ok(())
}

fn show(file: &Path) -> anyhow::Result<()> {
    let plan = load(file)?;
    for line in describe(&plan) {
        println!("{}", line);
    }
    Ok(())
}

/// Render a plan as indented display lines.
fn describe(plan: &Plan) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("Goal: {}", plan.goal));
    lines.push(format!("Reasoning: {}", plan.reasoning));
    for phase in &plan.phases {
        lines.push(format!(
            "{} — {} [{}]",
            phase.id, phase.name, phase.status
        ));
        for task in &phase.tasks {
            let detail = match &task.payload {
                TaskPayload::Terminal { command } => format!("$ {}", command),
                TaskPayload::FileEdit { .. } => "edit files".to_string(),
            };
            lines.push(format!(
                "  {} — {} ({}) [{}]",
                task.id, task.description, detail, task.status
            ));
        }
    }
    lines
}
