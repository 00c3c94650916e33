//! # ovs-edit
//!
//! Atomic multi-file edits for Overseer.
//!
//! An edit happens in two steps. Planning asks a [`ContextProvider`] for
//! candidate files and an [`EditBackend`] (a generation service) for a
//! structured change description, then materializes a [`FileEditPlan`] with
//! one unified diff per file. Execution applies the whole plan inside an
//! [`EditTransaction`]: pre-images are snapshotted first, every write is
//! applied in plan order, and any failure rolls the workspace back to its
//! pre-transaction state. A partially-applied edit set is never observable
//! after the call returns.
//!
//! ## Key components
//!
//! - [`FileEditPlan`] / [`FileDiff`] / [`FileAction`] — the edit model
//! - [`EditPlanner`] — context selection, strict decode, materialization
//! - [`EditTransaction`] — begin/commit/rollback with a drop-guard
//! - [`execute_multi_file_edit`] — all-or-nothing application

pub mod diff;
pub mod error;
pub mod plan;
pub mod transaction;

pub use error::EditError;
pub use plan::{
    ContextFile, ContextProvider, EditBackend, EditPlanner, EditRequest, FileAction, FileDiff,
    FileEditPlan, WalkContextProvider,
};
pub use transaction::{execute_multi_file_edit, AppliedChange, EditTransaction};
