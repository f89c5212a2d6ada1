//! Organization domain model
//!
//! An organization the controller may register runners for, together with the
//! repositories that are checked for queued workflow runs.

use serde::{Deserialize, Serialize};

/// A watched organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Organization login (e.g., "example-org")
    pub name: String,

    /// Repository names inside the organization; order carries no meaning
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl OrganizationConfig {
    /// Creates a new organization entry
    pub fn new(name: impl Into<String>, repositories: Vec<String>) -> Self {
        Self {
            name: name.into(),
            repositories,
        }
    }

    /// Web URL of the organization, the target a runner registers against
    ///
    /// # Arguments
    /// * `web_url` - Base web URL of the GitHub instance (e.g., "https://github.com")
    pub fn url(&self, web_url: &str) -> String {
        format!("{}/{}", web_url.trim_end_matches('/'), self.name)
    }

    /// Full name of one of this organization's repositories ("org/repo")
    pub fn full_repository_name(&self, repository: &str) -> String {
        format!("{}/{}", self.name, repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_web_url_and_name() {
        let org = OrganizationConfig::new("example-org", vec![]);
        assert_eq!(org.url("https://github.com"), "https://github.com/example-org");
        assert_eq!(
            org.url("https://ghe.internal/"),
            "https://ghe.internal/example-org"
        );
    }

    #[test]
    fn test_repositories_default_to_empty() {
        let org: OrganizationConfig = serde_json::from_str(r#"{"name": "solo"}"#).unwrap();
        assert_eq!(org.name, "solo");
        assert!(org.repositories.is_empty());
    }

    #[test]
    fn test_full_repository_name() {
        let org = OrganizationConfig::new("acme", vec!["widgets".to_string()]);
        assert_eq!(org.full_repository_name("widgets"), "acme/widgets");
    }
}
