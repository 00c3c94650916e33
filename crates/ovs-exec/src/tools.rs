// tools.rs — The uniform tool adapter contract.
//
// Adapters never raise for a failed command; they report failure through
// the outcome so the executor can decide whether the failure is worth a
// replan. Only the absence of an adapter is an error.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Result of one tool invocation, success or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolOutcome {
    pub success: bool,
    /// Captured output (stdout for shell commands).
    #[serde(default)]
    pub output: String,
    /// Failure detail when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }

    /// Best available failure text, for task errors and replan prompts.
    pub fn failure_message(&self) -> String {
        match &self.error {
            Some(error) if !error.is_empty() => error.clone(),
            _ if !self.output.is_empty() => self.output.clone(),
            _ => "command failed with no output".to_string(),
        }
    }
}

/// Runs shell commands on behalf of terminal tasks.
pub trait TerminalAdapter: Send + Sync {
    fn execute(&self, command: &str, cwd: &Path) -> ToolOutcome;
}
