// risk.rs — Show how the static risk rules classify a command.

use clap::Subcommand;

use ovs_risk::{classify_command, RiskLevel};

#[derive(Subcommand)]
pub enum RiskCommands {
    /// Classify a shell command.
    Classify {
        /// The command text, quoted.
        command: String,
    },
}

pub fn execute(cmd: &RiskCommands) -> anyhow::Result<()> {
    match cmd {
        RiskCommands::Classify { command } => {
            let level = classify_command(command);
            println!("{}", describe(command, level));
            Ok(())
        }
    }
}

fn describe(command: &str, level: RiskLevel) -> String {
    let gating = match level {
        RiskLevel::High => "requires approval before running",
        RiskLevel::Medium | RiskLevel::Low => "runs without approval",
    };
    format!("{} — {} ({})", command, level, gating)
}
