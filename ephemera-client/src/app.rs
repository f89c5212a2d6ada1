//! GitHub App authentication
//!
//! Exchanges the app's static identity (client ID + private key) for
//! installation-scoped access tokens:
//! app JWT -> installation lookup -> installation access token.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use ephemera_core::domain::permissions::InstallationPermissions;
use ephemera_core::dto::installation::{
    CreateInstallationToken, Installation, InstallationToken,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::GitHubClient;
use crate::error::Result;

/// Claims of the app-level JWT
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AppClaims {
    /// Issued at, backdated to absorb clock drift
    pub iat: i64,
    /// Expiry; GitHub rejects anything beyond ten minutes
    pub exp: i64,
    /// App client ID
    pub iss: String,
}

/// Static identity of the GitHub App
#[derive(Clone)]
pub struct AppCredentials {
    client_id: String,
    key: EncodingKey,
}

impl AppCredentials {
    /// Load credentials from the app's PEM-encoded RSA private key
    ///
    /// # Arguments
    /// * `client_id` - Client ID of the app
    /// * `private_key_pem` - Contents of the downloaded `.pem` file
    pub fn new(client_id: impl Into<String>, private_key_pem: &[u8]) -> Result<Self> {
        Ok(Self {
            client_id: client_id.into(),
            key: EncodingKey::from_rsa_pem(private_key_pem)?,
        })
    }

    /// Client ID of the app
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Sign a short-lived JWT identifying the app itself
    pub fn app_jwt(&self) -> Result<String> {
        let now = Utc::now();
        let claims = AppClaims {
            iat: (now - Duration::seconds(60)).timestamp(),
            exp: (now + Duration::minutes(9)).timestamp(),
            iss: self.client_id.clone(),
        };

        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.key)?)
    }
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    // =============================================================================
    // App Installations
    // =============================================================================

    /// Look up the app's installation on an organization
    ///
    /// # Arguments
    /// * `jwt` - App JWT from [`AppCredentials::app_jwt`]
    /// * `org` - Organization login
    pub async fn org_installation(&self, jwt: &str, org: &str) -> Result<Installation> {
        let path = format!("/orgs/{}/installation", org);
        let response = self.request(Method::GET, &path, jwt).send().await?;

        self.handle_response(response).await
    }

    /// Mint an installation access token with an explicit permission scope
    ///
    /// # Arguments
    /// * `jwt` - App JWT from [`AppCredentials::app_jwt`]
    /// * `installation_id` - ID returned by [`GitHubClient::org_installation`]
    /// * `permissions` - Scope of the token
    pub async fn create_installation_token(
        &self,
        jwt: &str,
        installation_id: u64,
        permissions: &InstallationPermissions,
    ) -> Result<InstallationToken> {
        let path = format!("/app/installations/{}/access_tokens", installation_id);
        let response = self
            .request(Method::POST, &path, jwt)
            .json(&CreateInstallationToken {
                permissions: permissions.clone(),
            })
            .send()
            .await?;

        self.handle_response(response).await
    }
}

/// Source of installation access tokens, one organization at a time
#[async_trait]
pub trait InstallationAuthenticator: Send + Sync {
    /// Perform a full exchange for an installation token on `org`
    ///
    /// Implementations do not cache; every call is a new exchange.
    async fn installation_token(&self, org: &str) -> Result<InstallationToken>;
}

/// Authenticator backed by the GitHub App flow
#[derive(Debug, Clone)]
pub struct AppAuthenticator {
    client: GitHubClient,
    credentials: AppCredentials,
    permissions: InstallationPermissions,
}

impl AppAuthenticator {
    /// Creates an authenticator requesting the runner controller scope
    pub fn new(client: GitHubClient, credentials: AppCredentials) -> Self {
        Self {
            client,
            credentials,
            permissions: InstallationPermissions::runner_controller(),
        }
    }
}

#[async_trait]
impl InstallationAuthenticator for AppAuthenticator {
    async fn installation_token(&self, org: &str) -> Result<InstallationToken> {
        let jwt = self.credentials.app_jwt()?;
        let installation = self.client.org_installation(&jwt, org).await?;
        debug!("Found installation {} for organisation {}", installation.id, org);

        self.client
            .create_installation_token(&jwt, installation.id, &self.permissions)
            .await
    }
}
