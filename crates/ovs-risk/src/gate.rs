// gate.rs — RiskGate: the approval checkpoint.
//
// A pending request is a oneshot sender parked in a mutex-guarded map,
// keyed by request id. The requester awaits the receiver under a timeout.
// Resolution and timeout race; whoever removes the map entry first wins,
// which gives exactly-once resolution without a separate timer registry.
//
// The gate fails closed: a timed-out or shutdown-drained request is a deny.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use ovs_events::{EventSink, OrchestratorEvent};

use crate::classify::{classify_invocation, RiskLevel, ToolInvocation};

/// How long a prompt waits for a decision before the gate denies it.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(60);

/// A pending approval request, as delivered to the external surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskRequest {
    pub id: Uuid,
    /// The run this request belongs to, when known. Cancelling that run
    /// force-denies the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub tool: String,
    pub command: String,
    pub cwd: String,
    pub risk: RiskLevel,
    pub created_at: DateTime<Utc>,
}

struct PendingApproval {
    request: RiskRequest,
    decision_tx: oneshot::Sender<bool>,
}

/// Approval checkpoint for high-risk tool invocations.
///
/// The pending table is process-wide shared state: one gate instance is
/// shared by every concurrently executing run. All map mutations happen
/// under the mutex.
pub struct RiskGate {
    pending: Mutex<HashMap<Uuid, PendingApproval>>,
    timeout: Duration,
}

impl RiskGate {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_APPROVAL_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Classify an invocation (delegates to the static rules).
    pub fn classify(&self, invocation: &ToolInvocation) -> RiskLevel {
        classify_invocation(invocation)
    }

    /// Suspend until the invocation is allowed or denied.
    ///
    /// Registers a pending request, notifies `events` with a `risk_prompt`,
    /// and parks the caller. Resolves `false` if nobody answers within the
    /// gate's timeout.
    pub async fn request_approval(
        &self,
        invocation: &ToolInvocation,
        run_id: Option<&str>,
        events: &dyn EventSink,
    ) -> bool {
        let request = RiskRequest {
            id: Uuid::new_v4(),
            run_id: run_id.map(str::to_string),
            tool: invocation.tool.clone(),
            command: invocation.command.clone(),
            cwd: invocation.cwd.clone(),
            risk: classify_invocation(invocation),
            created_at: Utc::now(),
        };
        let request_id = request.id;

        let (decision_tx, decision_rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().expect("risk gate poisoned");
            pending.insert(
                request_id,
                PendingApproval {
                    request: request.clone(),
                    decision_tx,
                },
            );
        }

        let prompt = OrchestratorEvent::RiskPrompt {
            request_id,
            tool: request.tool.clone(),
            command: request.command.clone(),
            cwd: request.cwd.clone(),
            risk: request.risk.to_string(),
            created_at: request.created_at,
        };
        if let Err(e) = events.emit(&prompt) {
            tracing::warn!("risk prompt sink error: {}", e);
        }

        tracing::info!(%request_id, command = %request.command, "awaiting risk approval");

        match tokio::time::timeout(self.timeout, decision_rx).await {
            Ok(Ok(allow)) => allow,
            // Sender dropped without a decision (shutdown drain).
            Ok(Err(_)) => false,
            Err(_) => {
                // Timed out. Remove the entry if resolution hasn't raced us.
                let removed = self
                    .pending
                    .lock()
                    .expect("risk gate poisoned")
                    .remove(&request_id)
                    .is_some();
                if removed {
                    tracing::warn!(%request_id, "risk approval timed out, denying");
                }
                false
            }
        }
    }

    /// Deliver a decision for a pending request.
    ///
    /// Returns `false` with no side effect if the request is unknown —
    /// already resolved, timed out, or never issued. A request is resolved
    /// exactly once.
    pub fn resolve(&self, request_id: Uuid, allow: bool) -> bool {
        let entry = self
            .pending
            .lock()
            .expect("risk gate poisoned")
            .remove(&request_id);
        match entry {
            Some(pending) => {
                tracing::info!(%request_id, allow, "risk decision delivered");
                pending.decision_tx.send(allow).is_ok()
            }
            None => false,
        }
    }

    /// Force-deny every pending request belonging to `run_id`.
    /// Returns the number of requests denied.
    pub fn cancel_run(&self, run_id: &str) -> usize {
        let drained: Vec<PendingApproval> = {
            let mut pending = self.pending.lock().expect("risk gate poisoned");
            let ids: Vec<Uuid> = pending
                .iter()
                .filter(|(_, p)| p.request.run_id.as_deref() == Some(run_id))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter().filter_map(|id| pending.remove(&id)).collect()
        };
        let count = drained.len();
        for entry in drained {
            let _ = entry.decision_tx.send(false);
        }
        if count > 0 {
            tracing::info!(run_id, count, "denied pending approvals for cancelled run");
        }
        count
    }

    /// Drain every pending request as denied. Part of the gate's stop
    /// lifecycle — no waiter is left parked forever.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<PendingApproval> = {
            let mut pending = self.pending.lock().expect("risk gate poisoned");
            pending.drain().map(|(_, p)| p).collect()
        };
        let count = drained.len();
        for entry in drained {
            let _ = entry.decision_tx.send(false);
        }
        count
    }

    /// Snapshot of the currently pending requests.
    pub fn pending_requests(&self) -> Vec<RiskRequest> {
        self.pending
            .lock()
            .expect("risk gate poisoned")
            .values()
            .map(|p| p.request.clone())
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("risk gate poisoned").len()
    }
}

impl Default for RiskGate {
    fn default() -> Self {
        Self::new()
    }
}
