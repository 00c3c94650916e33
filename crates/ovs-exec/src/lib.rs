//! # ovs-exec
//!
//! Plan execution for Overseer.
//!
//! The [`Executor`] drives a [`Plan`](ovs_plan::Plan) phase by phase. Each
//! phase is a retry/replan unit: on the first task failure the executor
//! asks the planner to regenerate the phase's task list and retries, up to
//! [`MAX_RETRIES`] attempts; exhaustion aborts the whole plan. Terminal
//! tasks flow through the risk gate before the adapter runs them; file
//! tasks are planned and applied as one atomic edit transaction.
//!
//! ## Key components
//!
//! - [`Executor`] — the per-phase retry/replan loop and task dispatch
//! - [`TerminalAdapter`] / [`ToolOutcome`] — the uniform tool contract
//! - [`ProcessTerminal`] — real shell-command adapter

pub mod error;
pub mod executor;
pub mod process;
pub mod tools;

pub use error::ExecError;
pub use executor::{Executor, MAX_RETRIES};
pub use process::ProcessTerminal;
pub use tools::{TerminalAdapter, ToolOutcome};
