//! Scheduler layer for the controller
//!
//! This layer drives the poll, decide, act cycle: scan for queued work,
//! provision runners one at a time, wait, repeat, and watch the stop signal
//! in between.

pub mod poller;

pub use poller::{Checkpoint, QueuePoller};
