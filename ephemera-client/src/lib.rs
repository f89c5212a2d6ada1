//! Ephemera GitHub Client
//!
//! A small, typed HTTP client for the handful of GitHub REST endpoints the
//! runner controller needs: app installation lookup and token exchange,
//! queued workflow run counts, and runner registration tokens.
//!
//! # Example
//!
//! ```no_run
//! use ephemera_client::{AppAuthenticator, AppCredentials, GitHubClient, InstallationAuthenticator};
//!
//! #[tokio::main]
//! async fn main() -> ephemera_client::Result<()> {
//!     let pem = std::fs::read("app.private-key.pem").expect("key file");
//!     let client = GitHubClient::new("https://api.github.com");
//!     let auth = AppAuthenticator::new(client.clone(), AppCredentials::new("Iv1.abc", &pem)?);
//!
//!     let installation = auth.installation_token("example-org").await?;
//!     let queued = client
//!         .queued_workflow_run_count(&installation.token, "example-org", "repo1")
//!         .await?;
//!
//!     println!("{} queued run(s)", queued);
//!     Ok(())
//! }
//! ```

mod actions;
mod app;
pub mod error;

// Re-export commonly used types
pub use app::{AppAuthenticator, AppCredentials, InstallationAuthenticator};
pub use ephemera_core::dto::actions::RegistrationToken;
pub use ephemera_core::dto::installation::{Installation, InstallationToken};
pub use error::{ClientError, Result};

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// Default REST endpoint for github.com
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const MEDIA_TYPE: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("ephemera/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the GitHub REST API
///
/// Endpoints are grouped by the credential they need:
/// - App endpoints take a signed app JWT (see [`AppCredentials::app_jwt`])
/// - Actions endpoints take an installation access token
#[derive(Debug, Clone)]
pub struct GitHubClient {
    /// Base URL of the REST API (e.g., "https://api.github.com")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the REST API; GitHub Enterprise Server
    ///   instances use "https://HOST/api/v3"
    ///
    /// # Example
    /// ```
    /// use ephemera_client::GitHubClient;
    ///
    /// let client = GitHubClient::new("https://api.github.com");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new GitHub client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an authenticated request with the headers GitHub expects
    fn request(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer_auth(bearer)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GitHubClient::new(DEFAULT_API_URL);
        assert_eq!(client.base_url(), "https://api.github.com");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GitHubClient::new("https://ghe.internal/api/v3/");
        assert_eq!(client.base_url(), "https://ghe.internal/api/v3");
    }

    #[tokio::test]
    async fn test_requests_carry_github_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/widgets/actions/runs")
            .match_query(mockito::Matcher::Any)
            .match_header("accept", MEDIA_TYPE)
            .match_header("x-github-api-version", API_VERSION)
            .match_header("user-agent", CLIENT_USER_AGENT)
            .match_header("authorization", "Bearer ghs_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"total_count": 0, "workflow_runs": []}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url());
        client
            .queued_workflow_run_count("ghs_token", "acme", "widgets")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widgets/actions/runs")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url());
        let err = client
            .queued_workflow_run_count("stale", "acme", "widgets")
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn test_malformed_body_becomes_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/acme/widgets/actions/runs")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = GitHubClient::new(server.url());
        let err = client
            .queued_workflow_run_count("ghs_token", "acme", "widgets")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ParseError(_)));
    }
}
