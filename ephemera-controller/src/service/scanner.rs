//! Queue scanner
//!
//! Finds the organizations that currently have at least one queued workflow
//! run. Organizations and their repositories are visited in a fresh random
//! order every cycle so that no organization is always favoured under
//! contention. Each organization stops at its first hit, and a failure in one
//! organization only excludes that organization from this cycle.

use ephemera_core::domain::organization::OrganizationConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::repository::ActionsRepository;

/// Outcome of scanning a single organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgScan {
    /// A repository with queued runs was found
    Queued { repository: String },
    /// Every repository was checked and none had queued runs
    Idle,
    /// The organization could not be scanned this cycle
    Skipped { reason: String },
}

/// Scanner over the configured organizations
pub struct QueueScanner {
    repository: Arc<dyn ActionsRepository>,
    rng: StdRng,
}

impl QueueScanner {
    /// Creates a scanner with an OS-seeded shuffle
    pub fn new(repository: Arc<dyn ActionsRepository>) -> Self {
        Self {
            repository,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a scanner whose shuffle order is reproducible
    #[cfg(test)]
    pub fn with_seed(repository: Arc<dyn ActionsRepository>, seed: u64) -> Self {
        Self {
            repository,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns the organizations with queued work, in the order they were
    /// scanned
    ///
    /// Never fails: organizations that cannot be scanned are logged and left
    /// out of the result.
    pub async fn scan(&mut self, organizations: &[OrganizationConfig]) -> Vec<OrganizationConfig> {
        let mut order = organizations.to_vec();
        order.shuffle(&mut self.rng);

        let mut with_queued_jobs = Vec::new();

        for org in order {
            match self.scan_organization(&org).await {
                OrgScan::Queued { repository } => {
                    info!(
                        "Found queued workflow run in repository: {}",
                        org.full_repository_name(&repository)
                    );
                    with_queued_jobs.push(org);
                }
                OrgScan::Idle => {
                    debug!("No queued workflow runs in organisation {}", org.name);
                }
                OrgScan::Skipped { reason } => {
                    warn!("Skipping organisation {} this cycle: {}", org.name, reason);
                }
            }
        }

        with_queued_jobs
    }

    /// Checks one organization's repositories until the first queued run
    ///
    /// The organization's credential is resolved before any repository is
    /// queried, so broken installation auth skips the organization even when
    /// it has no repositories.
    pub async fn scan_organization(&mut self, org: &OrganizationConfig) -> OrgScan {
        if let Err(e) = self.repository.authenticate(&org.name).await {
            return OrgScan::Skipped {
                reason: format!("{:#}", e),
            };
        }

        let mut repositories = org.repositories.clone();
        repositories.shuffle(&mut self.rng);

        for repository in repositories {
            match self.repository.queued_run_count(&org.name, &repository).await {
                Ok(0) => continue,
                Ok(_) => return OrgScan::Queued { repository },
                Err(e) => {
                    return OrgScan::Skipped {
                        reason: format!("{:#}", e),
                    };
                }
            }
        }

        OrgScan::Idle
    }
}
