//! # ovs-cli
//!
//! Command-line interface for Overseer.
//!
//! Drives plan files through the execution engine and inspects past runs:
//! - `ovs run <plan.json>` — execute a plan against a workspace
//! - `ovs plan validate/show` — check and display plan files
//! - `ovs risk classify` — show how a command would be classified
//! - `ovs runs list/show/delete` — inspect stored run snapshots

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Overseer CLI — execute plans and inspect runs.
#[derive(Parser)]
#[command(name = "ovs", version, about)]
struct Cli {
    /// Workspace directory the run operates on (defaults to current directory).
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a plan file against the workspace.
    Run {
        /// Path to the plan JSON file.
        plan_file: PathBuf,
        /// Identifier for this run (defaults to a fresh UUID).
        #[arg(long)]
        run_id: Option<String>,
        /// Approve every high-risk command without prompting.
        #[arg(long)]
        yes: bool,
        /// Seconds to wait for a high-risk approval before denying.
        #[arg(long, default_value_t = 60)]
        approval_timeout: u64,
    },
    /// Check and display plan files.
    Plan {
        #[command(subcommand)]
        command: commands::plan::PlanCommands,
    },
    /// Show how the risk rules classify a command.
    Risk {
        #[command(subcommand)]
        command: commands::risk::RiskCommands,
    },
    /// Inspect stored run snapshots.
    Runs {
        #[command(subcommand)]
        command: commands::runs::RunsCommands,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let workspace = cli.workspace.canonicalize().unwrap_or(cli.workspace);

    match &cli.command {
        Commands::Run {
            plan_file,
            run_id,
            yes,
            approval_timeout,
        } => commands::run::execute(
            &workspace,
            plan_file,
            run_id.as_deref(),
            *yes,
            *approval_timeout,
        ),
        Commands::Plan { command } => commands::plan::execute(command),
        Commands::Risk { command } => commands::risk::execute(command),
        Commands::Runs { command } => commands::runs::execute(command, &workspace),
    }
}
