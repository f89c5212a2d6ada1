//! Installation credential cache
//!
//! Owns the only shared mutable state in the controller: one installation
//! credential per organization, created lazily on first use and reused until
//! it is close to expiry or the API rejects it.

use chrono::{DateTime, Duration, Utc};
use ephemera_client::{InstallationAuthenticator, InstallationToken};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Remaining lifetime below which a cached credential is exchanged again
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Installation access token for one organization
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at - margin > now
    }
}

impl From<InstallationToken> for Credential {
    fn from(token: InstallationToken) -> Self {
        Self {
            token: token.token,
            expires_at: token.expires_at,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Per-organization cache in front of an [`InstallationAuthenticator`]
///
/// Failed exchanges are never cached. The lock is only held for map access,
/// never across the exchange itself.
pub struct CredentialCache {
    authenticator: Arc<dyn InstallationAuthenticator>,
    entries: Mutex<HashMap<String, Credential>>,
    refresh_margin: Duration,
}

impl CredentialCache {
    /// Creates an empty cache
    pub fn new(authenticator: Arc<dyn InstallationAuthenticator>) -> Self {
        Self {
            authenticator,
            entries: Mutex::new(HashMap::new()),
            refresh_margin: Duration::minutes(REFRESH_MARGIN_MINUTES),
        }
    }

    /// Returns the cached credential for `org`, exchanging for a new one if
    /// none is cached or the cached one is about to expire
    pub async fn get_or_create(&self, org: &str) -> ephemera_client::Result<Credential> {
        if let Some(credential) = self.lookup(org) {
            return Ok(credential);
        }

        info!("Authenticating app installation for organisation {}", org);
        let credential = Credential::from(self.authenticator.installation_token(org).await?);
        debug!(
            "Installation token for organisation {} expires at {}",
            org, credential.expires_at
        );

        let mut entries = self.entries.lock().unwrap();
        entries.insert(org.to_string(), credential.clone());
        Ok(credential)
    }

    /// Drops the cached credential for `org`
    ///
    /// Returns `true` if there was one.
    pub fn invalidate(&self, org: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(org).is_some()
    }

    /// Number of organizations with a cached credential
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn lookup(&self, org: &str) -> Option<Credential> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(org)
            .filter(|credential| credential.is_usable_at(Utc::now(), self.refresh_margin))
            .cloned()
    }
}
