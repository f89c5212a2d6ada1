//! Actions endpoints
//!
//! Both calls here are authenticated with an installation access token.

use crate::GitHubClient;
use crate::error::Result;
use ephemera_core::dto::actions::{RegistrationToken, WorkflowRunList};
use reqwest::Method;

impl GitHubClient {
    // =============================================================================
    // Workflow Runs
    // =============================================================================

    /// Count the queued workflow runs of a repository
    ///
    /// Only the total is needed, so a single-item page is requested.
    ///
    /// # Arguments
    /// * `token` - Installation access token for the owning organization
    /// * `owner` - Organization login
    /// * `repo` - Repository name
    pub async fn queued_workflow_run_count(
        &self,
        token: &str,
        owner: &str,
        repo: &str,
    ) -> Result<u64> {
        let path = format!("/repos/{}/{}/actions/runs", owner, repo);
        let response = self
            .request(Method::GET, &path, token)
            .query(&[("status", "queued"), ("per_page", "1")])
            .send()
            .await?;

        let runs: WorkflowRunList = self.handle_response(response).await?;
        Ok(runs.total_count)
    }

    // =============================================================================
    // Self-hosted Runners
    // =============================================================================

    /// Create a single-use token for registering a self-hosted runner
    ///
    /// Every call yields a fresh token; they are short-lived and must not be
    /// cached.
    ///
    /// # Arguments
    /// * `token` - Installation access token for the organization
    /// * `org` - Organization login
    pub async fn create_registration_token(
        &self,
        token: &str,
        org: &str,
    ) -> Result<RegistrationToken> {
        let path = format!("/orgs/{}/actions/runners/registration-token", org);
        let response = self.request(Method::POST, &path, token).send().await?;

        self.handle_response(response).await
    }
}
