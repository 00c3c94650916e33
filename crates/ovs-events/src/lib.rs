//! # ovs-events
//!
//! Event model and sink dispatch for Overseer.
//!
//! The orchestration core emits an [`OrchestratorEvent`] at every observable
//! point of a run: phase progress, task errors, file changes, risk prompts,
//! plan revisions, and completion. Sinks (JSONL log files, in-memory
//! buffers, future transports) receive events through the [`EventSink`]
//! trait; the core never consumes a sink's return value.
//!
//! ## Key components
//!
//! - [`OrchestratorEvent`] — the stable event types the core emits
//! - [`EventSink`] — trait for receiving events (log, memory, etc.)
//! - [`LogSink`] — appends events as JSONL to a file
//! - [`MemorySink`] — buffers events in memory (tests, summaries)
//! - [`EventDispatcher`] — fans one event out to every registered sink

pub mod error;
pub mod event;
pub mod sink;

pub use error::EventError;
pub use event::{FileChangeKind, OrchestratorEvent, PhaseSummary};
pub use sink::{EventDispatcher, EventSink, LogSink, MemorySink};
