// transaction.rs — All-or-nothing application of a FileEditPlan.
//
// Sequence: begin (snapshot pre-images) → apply writes in plan order →
// commit (discard snapshots). Any write failure triggers a full rollback
// to the captured pre-images. A transaction dropped without commit also
// rolls back, so the all-or-nothing invariant holds under early returns
// and misuse.
//
// Transactions are scoped to one workspace root; two transactions must not
// touch the same files concurrently.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EditError;
use crate::plan::{sanitize_path, FileAction, FileDiff, FileEditPlan};

/// One applied change, reported back for event emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub path: String,
    pub action: FileAction,
}

/// Snapshot-backed transaction over one workspace root.
pub struct EditTransaction {
    root: PathBuf,
    /// Pre-transaction content per touched path. `None` records that the
    /// file did not exist — rollback removes it.
    snapshots: HashMap<PathBuf, Option<Vec<u8>>>,
    committed: bool,
    rolled_back: bool,
}

impl EditTransaction {
    /// Snapshot the pre-transaction state of every file `plan` will touch.
    ///
    /// Pure creates contribute an absence record rather than content, so a
    /// rollback removes whatever the create wrote.
    pub fn begin(root: &Path, plan: &FileEditPlan) -> Result<Self, EditError> {
        let mut snapshots = HashMap::new();
        for file in &plan.files {
            let rel = sanitize_path(&file.path)?;
            let full = root.join(&rel);
            let snapshot = if full.exists() {
                Some(fs::read(&full).map_err(|source| EditError::Io {
                    path: file.path.clone(),
                    source,
                })?)
            } else {
                None
            };
            snapshots.insert(rel, snapshot);
        }
        Ok(Self {
            root: root.to_path_buf(),
            snapshots,
            committed: false,
            rolled_back: false,
        })
    }

    /// Apply one file change. On failure the caller must roll back.
    fn apply(&self, file: &FileDiff) -> Result<(), std::io::Error> {
        let full = self.root.join(&file.path);
        match file.action {
            FileAction::Create | FileAction::Modify => {
                if let Some(parent) = full.parent() {
                    fs::create_dir_all(parent)?;
                }
                let content = file.new_content.as_deref().unwrap_or_default();
                fs::write(&full, content)
            }
            FileAction::Delete => fs::remove_file(&full),
        }
    }

    /// Discard the snapshots; the applied writes stay.
    pub fn commit(mut self) {
        self.committed = true;
        self.snapshots.clear();
    }

    /// Restore every snapshotted path to its captured pre-image.
    ///
    /// Attempts every path even after a failure; the first failure is
    /// reported. A rollback failure leaves the workspace possibly
    /// inconsistent and must propagate distinctly.
    pub fn rollback(&mut self) -> Result<(), (PathBuf, std::io::Error)> {
        self.rolled_back = true;
        let mut first_failure: Option<(PathBuf, std::io::Error)> = None;

        for (rel, snapshot) in &self.snapshots {
            let full = self.root.join(rel);
            let result = match snapshot {
                Some(content) => {
                    if let Some(parent) = full.parent() {
                        let _ = fs::create_dir_all(parent);
                    }
                    fs::write(&full, content)
                }
                None => {
                    if full.exists() {
                        fs::remove_file(&full)
                    } else {
                        Ok(())
                    }
                }
            };
            if let Err(e) = result {
                if first_failure.is_none() {
                    first_failure = Some((rel.clone(), e));
                }
            }
        }

        match first_failure {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }
}

impl Drop for EditTransaction {
    fn drop(&mut self) {
        // Abandoned without commit — restore the pre-transaction state.
        if !self.committed && !self.rolled_back {
            if let Err((path, e)) = self.rollback() {
                tracing::error!(path = %path.display(), "rollback on drop failed: {}", e);
            }
        }
    }
}

/// Apply `plan` atomically against `workspace_root`.
///
/// Returns the applied changes on success. On a write failure the
/// workspace is restored to its pre-transaction state and the failure is
/// returned as [`EditError::WriteFailed`]; if the restoration itself fails,
/// [`EditError::RollbackFailed`] propagates instead.
pub fn execute_multi_file_edit(
    plan: &FileEditPlan,
    workspace_root: &Path,
) -> Result<Vec<AppliedChange>, EditError> {
    let mut txn = EditTransaction::begin(workspace_root, plan)?;
    let mut applied = Vec::with_capacity(plan.files.len());

    for file in &plan.files {
        if let Err(write_error) = txn.apply(file) {
            tracing::warn!(path = %file.path, "write failed, rolling back: {}", write_error);
            return match txn.rollback() {
                Ok(()) => Err(EditError::WriteFailed {
                    path: file.path.clone(),
                    source: write_error,
                }),
                Err((rollback_path, rollback_error)) => Err(EditError::RollbackFailed {
                    path: rollback_path.display().to_string(),
                    write_error: write_error.to_string(),
                    rollback_error: rollback_error.to_string(),
                }),
            };
        }
        applied.push(AppliedChange {
            path: file.path.clone(),
            action: file.action,
        });
    }

    txn.commit();
    tracing::info!(files = applied.len(), "edit transaction committed");
    Ok(applied)
}
