// store.rs — RunStore: snapshot persistence for inspection.
//
// Each run is stored as a JSON file: `<store_dir>/<run_id>.json`. This is
// not durable mid-flight state — a snapshot is written when the owner asks
// for one, so operators can list and inspect runs after the fact.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RunError;
use crate::machine::{RunSnapshot, RunStateMachine};

/// File-backed store of run snapshots, one JSON file per run.
pub struct RunStore {
    store_dir: PathBuf,
}

impl RunStore {
    /// Create a new store backed by the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: impl AsRef<Path>) -> Result<Self, RunError> {
        let store_dir = store_dir.as_ref().to_path_buf();
        fs::create_dir_all(&store_dir).map_err(|source| RunError::IoError {
            path: store_dir.display().to_string(),
            source,
        })?;
        Ok(Self { store_dir })
    }

    /// Save a snapshot of the machine (creates or overwrites).
    ///
    /// Fails with [`RunError::MissingRunId`] if the machine's context has
    /// no run id yet.
    pub fn save(&self, machine: &RunStateMachine) -> Result<String, RunError> {
        let run_id = machine
            .context()
            .run_id
            .clone()
            .ok_or(RunError::MissingRunId)?;
        let path = self.run_file(&run_id);
        let json = machine.to_json()?;
        fs::write(&path, json).map_err(|source| RunError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(run_id)
    }

    /// Load a snapshot by run id.
    pub fn load(&self, run_id: &str) -> Result<Option<RunSnapshot>, RunError> {
        let path = self.run_file(run_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| RunError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        let snapshot: RunSnapshot = serde_json::from_str(&json)?;
        Ok(Some(snapshot))
    }

    /// List all stored snapshots, most recently started first.
    pub fn list(&self) -> Result<Vec<RunSnapshot>, RunError> {
        let mut runs = Vec::new();

        let entries = fs::read_dir(&self.store_dir).map_err(|source| RunError::IoError {
            path: self.store_dir.display().to_string(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| RunError::IoError {
                path: self.store_dir.display().to_string(),
                source,
            })?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                let json = fs::read_to_string(&path).map_err(|source| RunError::IoError {
                    path: path.display().to_string(),
                    source,
                })?;
                if let Ok(snapshot) = serde_json::from_str::<RunSnapshot>(&json) {
                    runs.push(snapshot);
                }
            }
        }

        runs.sort_by(|a, b| b.context.started_at.cmp(&a.context.started_at));
        Ok(runs)
    }

    /// Delete a stored snapshot. Returns false if it didn't exist.
    pub fn delete(&self, run_id: &str) -> Result<bool, RunError> {
        let path = self.run_file(run_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| RunError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(true)
    }

    fn run_file(&self, run_id: &str) -> PathBuf {
        self.store_dir.join(format!("{}.json", run_id))
    }
}
