//! Service layer
//!
//! Services hold the controller's decisions: which organizations have work,
//! and how a runner is brought up for one of them. They use repositories and
//! the runner agent, and report outcomes as typed values so the control loop
//! can log and move on without ever crashing.

mod lifecycle;
mod scanner;

pub use lifecycle::{ProvisionError, RunnerLifecycle};
pub use scanner::{OrgScan, QueueScanner};
