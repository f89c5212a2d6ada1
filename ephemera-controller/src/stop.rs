//! Cooperative shutdown
//!
//! The control loop polls a [`StopSignal`] at fixed checkpoints instead of
//! being interrupted. In production the signal is the existence of a marker
//! file that operators create when they want the controller to wind down once
//! the current runner has finished.

use std::path::{Path, PathBuf};

/// A condition the control loop polls to decide whether to exit
pub trait StopSignal: Send + Sync {
    /// Returns `true` once the controller should shut down
    fn should_stop(&self) -> bool;
}

/// Stop signal backed by a marker file
///
/// The controller only ever reads the marker; creating and removing it is up
/// to whoever operates the controller.
#[derive(Debug, Clone)]
pub struct StopFile {
    path: Option<PathBuf>,
}

impl StopFile {
    /// Creates a stop signal watching `path`; `None` never stops
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Path of the marker file, if one is configured
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl StopSignal for StopFile {
    fn should_stop(&self) -> bool {
        self.path.as_deref().is_some_and(Path::exists)
    }
}
