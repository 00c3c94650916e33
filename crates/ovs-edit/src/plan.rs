// plan.rs — Edit planning: context selection, strict decode, materialization.
//
// Planning never mutates the workspace. It reads originals to build diffs
// and to decide the action fallbacks:
// - modify of a missing file falls back to create
// - delete of a missing file is silently dropped from the plan

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diff::{delete_file_diff, new_file_diff, unified_diff};
use crate::error::EditError;

/// What happens to one file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Create,
    Modify,
    Delete,
}

impl std::fmt::Display for FileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileAction::Create => write!(f, "create"),
            FileAction::Modify => write!(f, "modify"),
            FileAction::Delete => write!(f, "delete"),
        }
    }
}

/// One planned file change, with a displayable unified diff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileDiff {
    /// Path relative to the workspace root.
    pub path: String,
    pub action: FileAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    pub diff: String,
}

/// A fully materialized multi-file edit, ready for the transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEditPlan {
    /// The change spec this plan was produced for.
    pub task: String,
    pub reasoning: String,
    pub files: Vec<FileDiff>,
}

/// A candidate file handed to the edit backend as context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextFile {
    pub path: String,
    pub content: String,
}

/// What the planner asks the edit backend to do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    pub change_spec: String,
    pub context_id: String,
    pub context_files: Vec<ContextFile>,
}

/// Token-budget-aware candidate selection. The ranking/truncation
/// algorithm is external — implementations just return the chosen paths.
pub trait ContextProvider: Send + Sync {
    fn select_context(
        &self,
        change_spec: &str,
        workspace_root: &Path,
        context_id: &str,
    ) -> Result<Vec<PathBuf>, EditError>;
}

/// External generation service producing structured edit descriptions.
pub trait EditBackend: Send + Sync {
    fn generate_edit(&self, request: &EditRequest) -> Result<String, EditError>;
}

/// Wire schema of an edit response.
#[derive(Debug, Deserialize)]
struct EditResponse {
    reasoning: String,
    files: Vec<FileChangeResponse>,
}

#[derive(Debug, Deserialize)]
struct FileChangeResponse {
    path: String,
    action: FileAction,
    /// Full new content for create/modify; absent for delete.
    #[serde(default)]
    content: Option<String>,
}

/// A [`ContextProvider`] that walks the workspace and returns every file,
/// smallest paths first, capped at a fixed count. Good enough for small
/// workspaces and for tests; real deployments plug in an index-backed
/// provider.
pub struct WalkContextProvider {
    max_files: usize,
}

impl WalkContextProvider {
    pub fn new(max_files: usize) -> Self {
        Self { max_files }
    }
}

impl Default for WalkContextProvider {
    fn default() -> Self {
        Self::new(32)
    }
}

impl ContextProvider for WalkContextProvider {
    fn select_context(
        &self,
        _change_spec: &str,
        workspace_root: &Path,
        _context_id: &str,
    ) -> Result<Vec<PathBuf>, EditError> {
        let mut files = Vec::new();
        walk_dir(workspace_root, workspace_root, &mut files)?;
        files.sort();
        files.truncate(self.max_files);
        Ok(files)
    }
}

fn walk_dir(dir: &Path, root: &Path, files: &mut Vec<PathBuf>) -> Result<(), EditError> {
    if !dir.exists() {
        return Ok(());
    }
    let entries = fs::read_dir(dir).map_err(|source| EditError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| EditError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, root, files)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }
    Ok(())
}

/// Plans multi-file edits over a context provider and an edit backend.
pub struct EditPlanner {
    context: Box<dyn ContextProvider>,
    backend: Box<dyn EditBackend>,
}

impl EditPlanner {
    pub fn new(context: Box<dyn ContextProvider>, backend: Box<dyn EditBackend>) -> Self {
        Self { context, backend }
    }

    /// Produce a [`FileEditPlan`] for `change_spec` against `workspace_root`.
    pub fn plan_multi_file_edit(
        &self,
        change_spec: &str,
        workspace_root: &Path,
        context_id: &str,
    ) -> Result<FileEditPlan, EditError> {
        let candidates = self
            .context
            .select_context(change_spec, workspace_root, context_id)?;

        let context_files = candidates
            .iter()
            .filter_map(|rel| {
                let content = fs::read_to_string(workspace_root.join(rel)).ok()?;
                Some(ContextFile {
                    path: rel.display().to_string(),
                    content,
                })
            })
            .collect();

        let raw = self.backend.generate_edit(&EditRequest {
            change_spec: change_spec.to_string(),
            context_id: context_id.to_string(),
            context_files,
        })?;

        let response: EditResponse =
            serde_json::from_str(&raw).map_err(|e| EditError::InvalidResponse {
                detail: e.to_string(),
            })?;

        let mut files = Vec::new();
        for change in response.files {
            if let Some(diff) = materialize(workspace_root, change)? {
                files.push(diff);
            }
        }

        tracing::info!(change_spec, files = files.len(), "edit planned");

        Ok(FileEditPlan {
            task: change_spec.to_string(),
            reasoning: response.reasoning,
            files,
        })
    }
}

/// Turn one decoded change into a concrete [`FileDiff`].
///
/// Returns `Ok(None)` when the change should be dropped (delete of an
/// already-absent target).
fn materialize(
    workspace_root: &Path,
    change: FileChangeResponse,
) -> Result<Option<FileDiff>, EditError> {
    let rel = sanitize_path(&change.path)?;
    let full = workspace_root.join(&rel);

    match change.action {
        FileAction::Create => {
            let content = require_content(change.content, FileAction::Create, &change.path)?;
            let diff = new_file_diff(&change.path, &content);
            Ok(Some(FileDiff {
                path: change.path,
                action: FileAction::Create,
                original_content: None,
                new_content: Some(content),
                diff,
            }))
        }
        FileAction::Modify => {
            let content = require_content(change.content, FileAction::Modify, &change.path)?;
            if !full.exists() {
                // Original is gone — fall back to create.
                tracing::debug!(path = %change.path, "modify target missing, creating");
                let diff = new_file_diff(&change.path, &content);
                return Ok(Some(FileDiff {
                    path: change.path,
                    action: FileAction::Create,
                    original_content: None,
                    new_content: Some(content),
                    diff,
                }));
            }
            let original = fs::read_to_string(&full).map_err(|source| EditError::Io {
                path: change.path.clone(),
                source,
            })?;
            let diff = unified_diff(&change.path, &original, &content);
            Ok(Some(FileDiff {
                path: change.path,
                action: FileAction::Modify,
                original_content: Some(original),
                new_content: Some(content),
                diff,
            }))
        }
        FileAction::Delete => {
            if !full.exists() {
                // Nothing to delete — drop the entry.
                tracing::debug!(path = %change.path, "delete target already absent, dropping");
                return Ok(None);
            }
            let original = fs::read_to_string(&full).map_err(|source| EditError::Io {
                path: change.path.clone(),
                source,
            })?;
            let diff = delete_file_diff(&change.path, &original);
            Ok(Some(FileDiff {
                path: change.path,
                action: FileAction::Delete,
                original_content: Some(original),
                new_content: None,
                diff,
            }))
        }
    }
}

fn require_content(
    content: Option<String>,
    action: FileAction,
    path: &str,
) -> Result<String, EditError> {
    content.ok_or_else(|| EditError::MissingContent {
        action: action.to_string(),
        path: path.to_string(),
    })
}

/// Reject paths that could escape the workspace root.
pub(crate) fn sanitize_path(path: &str) -> Result<PathBuf, EditError> {
    if path.contains("..") || Path::new(path).is_absolute() {
        return Err(EditError::PathTraversal {
            path: path.to_string(),
        });
    }
    Ok(PathBuf::from(path))
}
