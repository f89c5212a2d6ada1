//! Queue poller
//!
//! Runs the controller's main loop. Each cycle:
//! 1. checks the stop signal, then scans for organizations with queued runs
//! 2. for each hit in scan order, checks the stop signal, then provisions a
//!    runner and waits for it to finish
//! 3. checks the stop signal, then sleeps for the poll interval
//!
//! Everything runs sequentially on the calling task. Failures are logged and
//! the loop moves on to the next unit of work; only the stop signal ends it.

use ephemera_core::domain::organization::OrganizationConfig;
use std::fmt;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{error, info};

use crate::service::{QueueScanner, RunnerLifecycle};
use crate::stop::StopSignal;

/// Point in the cycle at which the stop signal is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    BeforeScan,
    BeforeProvision,
    BeforeWait,
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::BeforeScan => write!(f, "before scan"),
            Checkpoint::BeforeProvision => write!(f, "before provisioning"),
            Checkpoint::BeforeWait => write!(f, "before waiting"),
        }
    }
}

/// Control loop over the scanner and the runner lifecycle
pub struct QueuePoller {
    organizations: Vec<OrganizationConfig>,
    poll_interval: Duration,
    scanner: QueueScanner,
    lifecycle: RunnerLifecycle,
    stop: Arc<dyn StopSignal>,
}

impl QueuePoller {
    /// Creates a new queue poller
    pub fn new(
        organizations: Vec<OrganizationConfig>,
        poll_interval: Duration,
        scanner: QueueScanner,
        lifecycle: RunnerLifecycle,
        stop: Arc<dyn StopSignal>,
    ) -> Self {
        Self {
            organizations,
            poll_interval,
            scanner,
            lifecycle,
            stop,
        }
    }

    /// Runs cycles until the stop signal is seen
    ///
    /// Returns the checkpoint at which it was seen.
    pub async fn run(&mut self) -> Checkpoint {
        info!(
            "Starting queue poller ({} organisation(s), interval: {:?})",
            self.organizations.len(),
            self.poll_interval
        );

        loop {
            if let Some(checkpoint) = self.run_cycle().await {
                return checkpoint;
            }

            time::sleep(self.poll_interval).await;
        }
    }

    /// Performs a single scan and provisioning cycle, up to but excluding the
    /// wait
    ///
    /// Returns the checkpoint if the stop signal was seen.
    pub async fn run_cycle(&mut self) -> Option<Checkpoint> {
        if self.stop_requested(Checkpoint::BeforeScan) {
            return Some(Checkpoint::BeforeScan);
        }

        info!("Polling for queued workflow runs...");
        let candidates = self.scanner.scan(&self.organizations).await;

        if candidates.is_empty() {
            info!("No queued workflow runs found");
        }

        for org in &candidates {
            if self.stop_requested(Checkpoint::BeforeProvision) {
                return Some(Checkpoint::BeforeProvision);
            }

            info!("Registering runner to organisation: {}", org.name);
            match self.lifecycle.provision(org).await {
                Ok(()) => info!("Workflow run complete"),
                Err(e) => error!("Provisioning for organisation {} failed: {}", org.name, e),
            }
        }

        if self.stop_requested(Checkpoint::BeforeWait) {
            return Some(Checkpoint::BeforeWait);
        }

        info!("Waiting...");
        None
    }

    fn stop_requested(&self, checkpoint: Checkpoint) -> bool {
        let stop = self.stop.should_stop();
        if stop {
            info!("Stop file found ({}), exiting...", checkpoint);
        }
        stop
    }
}
