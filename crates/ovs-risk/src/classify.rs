// classify.rs — Static risk classification rules.
//
// Classification is a pure function over the command text. The rules are
// ordered: destructive patterns win over the medium table, so
// "git push --force" is high even though "git push" alone is medium.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How risky a tool invocation is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// What a tool adapter is about to execute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Which tool (e.g., "terminal").
    pub tool: String,
    /// The command or target being executed.
    pub command: String,
    /// Working directory the command runs in.
    pub cwd: String,
}

/// Destructive operations — history rewrites, force pushes, recursive
/// deletes. These always require explicit approval.
const HIGH_RISK_PATTERNS: &[&str] = &[
    "git push --force",
    "git push -f",
    "git reset --hard",
    "git clean -f",
    "git branch -d",
    "git branch --delete --force",
    "git stash drop",
    "git rebase",
    "rm -rf",
    "rm -fr",
];

/// Operations that mutate shared or external state but are routinely
/// reversible — installs, test runs, commits, branch switches.
const MEDIUM_RISK_PATTERNS: &[&str] = &[
    "npm install",
    "npm ci",
    "yarn add",
    "pnpm add",
    "pip install",
    "cargo add",
    "cargo install",
    "npm test",
    "cargo test",
    "pytest",
    "git commit",
    "git checkout",
    "git switch",
    "git merge",
    "git pull",
    "git push",
];

/// Classify a command by static text-pattern rules.
pub fn classify_command(command: &str) -> RiskLevel {
    let normalized = command.to_lowercase();
    if HIGH_RISK_PATTERNS.iter().any(|p| normalized.contains(p)) {
        return RiskLevel::High;
    }
    if MEDIUM_RISK_PATTERNS.iter().any(|p| normalized.contains(p)) {
        return RiskLevel::Medium;
    }
    RiskLevel::Low
}

/// Classify an invocation. Currently keyed entirely off the command text.
pub fn classify_invocation(invocation: &ToolInvocation) -> RiskLevel {
    classify_command(&invocation.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructive_vcs_operations_are_high() {
        assert_eq!(classify_command("git push --force origin main"), RiskLevel::High);
        assert_eq!(classify_command("git push -f"), RiskLevel::High);
        assert_eq!(classify_command("git reset --hard HEAD~3"), RiskLevel::High);
        assert_eq!(classify_command("git clean -fd"), RiskLevel::High);
        assert_eq!(classify_command("rm -rf target"), RiskLevel::High);
    }

    #[test]
    fn installs_tests_commits_checkouts_are_medium() {
        assert_eq!(classify_command("npm install express"), RiskLevel::Medium);
        assert_eq!(classify_command("pip install requests"), RiskLevel::Medium);
        assert_eq!(classify_command("cargo test --workspace"), RiskLevel::Medium);
        assert_eq!(classify_command("git commit -m 'wip'"), RiskLevel::Medium);
        assert_eq!(classify_command("git checkout feature/x"), RiskLevel::Medium);
        assert_eq!(classify_command("git push origin main"), RiskLevel::Medium);
    }

    #[test]
    fn everything_else_is_low() {
        assert_eq!(classify_command("ls -la"), RiskLevel::Low);
        assert_eq!(classify_command("node -v"), RiskLevel::Low);
        assert_eq!(classify_command("cargo build"), RiskLevel::Low);
        assert_eq!(classify_command("git status"), RiskLevel::Low);
    }

    #[test]
    fn high_wins_over_medium_on_overlap() {
        // Matches both "git commit" (medium) and a force push (high).
        assert_eq!(
            classify_command("git commit -m 'wip' && git push --force"),
            RiskLevel::High
        );
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_command("Git Push --Force"), RiskLevel::High);
        assert_eq!(classify_command("NPM INSTALL"), RiskLevel::Medium);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }
}
