// process.rs — TerminalAdapter backed by a real shell.

use std::path::Path;
use std::process::Command;

use crate::tools::{TerminalAdapter, ToolOutcome};

/// Runs terminal tasks through the platform shell, blocking until the
/// command exits and capturing both streams.
#[derive(Debug, Default)]
pub struct ProcessTerminal;

impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }
}

impl TerminalAdapter for ProcessTerminal {
    fn execute(&self, command: &str, cwd: &Path) -> ToolOutcome {
        tracing::debug!(command, cwd = %cwd.display(), "running shell command");

        #[cfg(unix)]
        let result = Command::new("sh").arg("-c").arg(command).current_dir(cwd).output();
        #[cfg(windows)]
        let result = Command::new("cmd").arg("/C").arg(command).current_dir(cwd).output();

        let output = match result {
            Ok(output) => output,
            Err(e) => return ToolOutcome::failed(format!("failed to spawn shell: {}", e)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            ToolOutcome::ok(stdout)
        } else {
            let detail = if stderr.trim().is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr.trim_end().to_string()
            };
            ToolOutcome {
                success: false,
                output: stdout,
                error: Some(detail),
            }
        }
    }
}
