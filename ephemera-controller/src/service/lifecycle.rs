//! Runner lifecycle
//!
//! Brings up exactly one ephemeral runner for an organization and blocks until
//! it has finished its job. The previous registration is always removed first,
//! including on the very first call, so at most one registration exists.

use ephemera_core::domain::organization::OrganizationConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::agent::{AgentError, RunnerAgent};
use crate::repository::ActionsRepository;

/// The lifecycle step that failed
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to deregister previous runner: {0}")]
    Deregister(#[source] AgentError),

    #[error("failed to obtain registration token: {0:#}")]
    RegistrationToken(#[source] anyhow::Error),

    #[error("failed to register runner: {0}")]
    Register(#[source] AgentError),

    #[error("runner failed: {0}")]
    Run(#[source] AgentError),
}

/// Deregister, fetch token, register, run
pub struct RunnerLifecycle {
    agent: Arc<dyn RunnerAgent>,
    repository: Arc<dyn ActionsRepository>,
    web_url: String,
}

impl RunnerLifecycle {
    /// Creates a lifecycle manager
    ///
    /// # Arguments
    /// * `agent` - Process boundary to the runner installation
    /// * `repository` - Source of registration tokens
    /// * `web_url` - Web base URL organizations live under
    pub fn new(
        agent: Arc<dyn RunnerAgent>,
        repository: Arc<dyn ActionsRepository>,
        web_url: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            repository,
            web_url: web_url.into(),
        }
    }

    /// Provisions one ephemeral runner for `org` and waits for it to exit
    ///
    /// Any failing step aborts the remaining ones.
    pub async fn provision(&self, org: &OrganizationConfig) -> Result<(), ProvisionError> {
        self.agent
            .deregister()
            .await
            .map_err(ProvisionError::Deregister)?;

        let token = self
            .repository
            .registration_token(&org.name)
            .await
            .map_err(ProvisionError::RegistrationToken)?;

        let url = org.url(&self.web_url);
        debug!("Registering ephemeral runner against {}", url);
        self.agent
            .register(&url, &token)
            .await
            .map_err(ProvisionError::Register)?;

        self.agent.run().await.map_err(ProvisionError::Run)
    }
}
