//! # ovs-plan
//!
//! Plan model and goal planning for Overseer.
//!
//! A [`Plan`] decomposes one goal into ordered [`Phase`]s of [`Task`]s.
//! The [`Planner`] produces plans by asking a [`PlanBackend`] (an external
//! generation service) for a structured response and decoding it strictly —
//! an undecodable response is a typed [`PlanError::InvalidResponse`], never
//! a best-effort salvage.
//!
//! ## Key components
//!
//! - [`Plan`] / [`Phase`] / [`Task`] — the plan data model
//! - [`TaskPayload`] — tagged union of tool-specific task inputs
//! - [`Planner`] — `plan_project` and `replan_phase` over a backend
//! - [`FixtureBackend`] — canned responses for tests and offline runs

pub mod error;
pub mod fixture;
pub mod model;
pub mod planner;

pub use error::PlanError;
pub use fixture::FixtureBackend;
pub use model::{Phase, PhaseStatus, Plan, Task, TaskPayload, TaskStatus};
pub use planner::{PlanBackend, Planner};
