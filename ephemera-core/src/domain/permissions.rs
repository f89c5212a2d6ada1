//! GitHub App permission scopes
//!
//! Installation tokens are always requested with an explicit, minimal scope
//! rather than inheriting every permission the app was granted.

use serde::{Deserialize, Serialize};

/// Access level for a single permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Write,
}

/// Permission set requested for an installation access token
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstallationPermissions {
    /// Access to workflow runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<PermissionLevel>,

    /// Access to the organization's self-hosted runner registrations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_self_hosted_runners: Option<PermissionLevel>,
}

impl InstallationPermissions {
    /// The scope the controller needs: read workflow runs, manage runners
    pub fn runner_controller() -> Self {
        Self {
            actions: Some(PermissionLevel::Read),
            organization_self_hosted_runners: Some(PermissionLevel::Write),
        }
    }
}
