//! Actions repository
//!
//! Handles the two Actions API operations the controller needs:
//! - Counting queued workflow runs in a repository
//! - Issuing runner registration tokens for an organization

use anyhow::{Context, Result};
use async_trait::async_trait;
use ephemera_client::GitHubClient;
use std::sync::Arc;
use tracing::warn;

use crate::credentials::CredentialCache;

/// Repository trait for Actions operations, authenticated per organization
#[async_trait]
pub trait ActionsRepository: Send + Sync {
    /// Makes sure an installation credential for `org` is available
    async fn authenticate(&self, org: &str) -> Result<()>;

    /// Number of workflow runs in `org/repo` whose status is "queued"
    async fn queued_run_count(&self, org: &str, repo: &str) -> Result<u64>;

    /// A fresh single-use runner registration token for `org`
    async fn registration_token(&self, org: &str) -> Result<String>;
}

/// HTTP implementation of ActionsRepository
pub struct HttpActionsRepository {
    client: GitHubClient,
    credentials: Arc<CredentialCache>,
}

impl HttpActionsRepository {
    /// Creates a new HTTP actions repository
    ///
    /// # Arguments
    /// * `client` - GitHub REST client
    /// * `credentials` - Installation credential cache shared by all calls
    pub fn new(client: GitHubClient, credentials: Arc<CredentialCache>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Evicts the organization's credential when the API rejected it, so the
    /// next call re-runs the installation exchange
    fn evict_if_unauthorized<T>(&self, org: &str, result: &ephemera_client::Result<T>) {
        if matches!(result, Err(e) if e.is_unauthorized()) && self.credentials.invalidate(org) {
            warn!(
                "Installation credential for organisation {} was rejected, discarding it",
                org
            );
        }
    }
}

#[async_trait]
impl ActionsRepository for HttpActionsRepository {
    async fn authenticate(&self, org: &str) -> Result<()> {
        self.credentials
            .get_or_create(org)
            .await
            .with_context(|| format!("Failed to authenticate for organisation {}", org))?;
        Ok(())
    }

    async fn queued_run_count(&self, org: &str, repo: &str) -> Result<u64> {
        let credential = self
            .credentials
            .get_or_create(org)
            .await
            .with_context(|| format!("Failed to authenticate for organisation {}", org))?;

        let result = self
            .client
            .queued_workflow_run_count(&credential.token, org, repo)
            .await;
        self.evict_if_unauthorized(org, &result);

        result.with_context(|| format!("Failed to list queued workflow runs for {}/{}", org, repo))
    }

    async fn registration_token(&self, org: &str) -> Result<String> {
        let credential = self
            .credentials
            .get_or_create(org)
            .await
            .with_context(|| format!("Failed to authenticate for organisation {}", org))?;

        let result = self
            .client
            .create_registration_token(&credential.token, org)
            .await;
        self.evict_if_unauthorized(org, &result);

        let token = result
            .with_context(|| format!("Failed to create registration token for {}", org))?;
        Ok(token.token)
    }
}
