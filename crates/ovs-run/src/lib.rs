//! # ovs-run
//!
//! Run lifecycle management for Overseer.
//!
//! A run is one end-to-end execution attempt of a plan. The
//! [`RunStateMachine`] validates and records every lifecycle transition:
//!
//! ```text
//! idle → planning → executing → testing ⇄ fixing → done
//!   (error is reachable from every working state; a cancelled run
//!    can be re-armed back to idle)
//! ```
//!
//! ## Key components
//!
//! - [`RunState`] — the closed set of lifecycle states
//! - [`RunStateMachine`] — transition validation, context, append-only history
//! - [`RunSnapshot`] — lossless JSON round-trip of machine state
//! - [`RunStore`] — JSON file-per-run persistence of snapshots

pub mod error;
pub mod machine;
pub mod state;
pub mod store;

pub use error::RunError;
pub use machine::{ContextUpdate, RunContext, RunSnapshot, RunStateMachine, TransitionRecord};
pub use state::{RunMode, RunState};
pub use store::RunStore;
