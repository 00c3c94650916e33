// sink.rs — Event sinks and the fan-out dispatcher.
//
// A sink decides what to do with each event: append to a log file, buffer
// in memory, forward to a transport. The dispatcher delivers every event to
// every sink; a failing sink is logged and skipped, never fatal — the core
// treats emission as fire-and-forget.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::EventError;
use crate::event::OrchestratorEvent;

/// Trait for receiving orchestration events.
///
/// Implementations must be `Send + Sync` — the executor and the risk gate
/// both hold references to the sink, possibly from different tasks.
pub trait EventSink: Send + Sync {
    /// Handle an event. Errors are logged by the dispatcher but never stop
    /// the run.
    fn emit(&self, event: &OrchestratorEvent) -> Result<(), EventError>;
}

/// Logs events as JSONL to a file (always-on sink).
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: &OrchestratorEvent) -> Result<(), EventError> {
        // Ensure parent directory exists.
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| EventError::IoError {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| EventError::IoError {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(|source| EventError::IoError {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

/// Buffers events in memory for later inspection.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<OrchestratorEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far.
    pub fn events(&self) -> Vec<OrchestratorEvent> {
        self.events.lock().expect("event buffer poisoned").clone()
    }

    /// Count of events with the given type name.
    pub fn count_of(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .expect("event buffer poisoned")
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &OrchestratorEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .expect("event buffer poisoned")
            .push(event.clone());
        Ok(())
    }
}

/// Dispatches events to multiple sinks.
///
/// Errors from individual sinks are logged (via tracing) but don't prevent
/// other sinks from receiving the event.
#[derive(Default)]
pub struct EventDispatcher {
    sinks: Vec<Box<dyn EventSink>>,
}

impl EventDispatcher {
    /// Create a new dispatcher with no sinks.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add an event sink.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Dispatch an event to all sinks.
    pub fn dispatch(&self, event: &OrchestratorEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event) {
                tracing::warn!("event sink error: {}", e);
            }
        }
    }
}

impl EventSink for EventDispatcher {
    fn emit(&self, event: &OrchestratorEvent) -> Result<(), EventError> {
        self.dispatch(event);
        Ok(())
    }
}
