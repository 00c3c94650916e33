//! # ovs-risk
//!
//! Risk classification and approval gating for Overseer.
//!
//! Every side-effecting tool invocation is classified by static text rules
//! ([`classify_command`]). Only `high`-risk actions are gated: the
//! [`RiskGate`] registers a pending request, notifies the event sink with a
//! `risk_prompt`, and suspends the caller until an external surface answers
//! through [`RiskGate::resolve`] — or the timeout fires and the gate fails
//! closed (deny). `medium` and `low` proceed unconditionally; that is a
//! policy choice, not a mechanism limitation.
//!
//! ## Key components
//!
//! - [`RiskLevel`] / [`classify_command`] — static classification rules
//! - [`ToolInvocation`] — what a tool is about to do
//! - [`RiskGate`] — pending-request table, suspension, exactly-once resolution

pub mod classify;
pub mod gate;

pub use classify::{classify_command, classify_invocation, RiskLevel, ToolInvocation};
pub use gate::{RiskGate, RiskRequest, DEFAULT_APPROVAL_TIMEOUT};
