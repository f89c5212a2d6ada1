//! Actions DTOs
//!
//! Workflow run listings and self-hosted runner registration tokens.

use serde::{Deserialize, Serialize};

/// Response of `GET /repos/{owner}/{repo}/actions/runs`
///
/// Only the total is read; the page of runs itself is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunList {
    pub total_count: u64,
}

/// Response of `POST /orgs/{org}/actions/runners/registration-token`
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrationToken {
    /// Single-use token passed to the runner's configuration script
    pub token: String,
}

impl std::fmt::Debug for RegistrationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationToken")
            .field("token", &"<redacted>")
            .finish()
    }
}
