//! In-memory fakes for the controller's collaborators

use async_trait::async_trait;
use chrono::{Duration, Utc};
use ephemera_client::{ClientError, InstallationAuthenticator, InstallationToken};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::agent::{AgentError, RunnerAgent};
use crate::repository::ActionsRepository;
use crate::stop::StopSignal;

/// Authenticator that mints numbered tokens ("token-{org}-{n}")
pub struct FakeAuthenticator {
    exchanges: Mutex<Vec<String>>,
    fail_next: AtomicBool,
    lifetime: Duration,
}

impl FakeAuthenticator {
    pub fn new() -> Self {
        Self {
            exchanges: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
            lifetime: Duration::hours(1),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn exchanges(&self) -> Vec<String> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl InstallationAuthenticator for FakeAuthenticator {
    async fn installation_token(&self, org: &str) -> ephemera_client::Result<InstallationToken> {
        let attempt = {
            let mut exchanges = self.exchanges.lock().unwrap();
            exchanges.push(org.to_string());
            exchanges.iter().filter(|o| o.as_str() == org).count()
        };

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ClientError::api_error(404, "Not Found"));
        }

        Ok(InstallationToken {
            token: format!("token-{}-{}", org, attempt),
            expires_at: Utc::now() + self.lifetime,
        })
    }
}

/// Actions repository answering from a fixed table of queued-run counts
#[derive(Default)]
pub struct FakeActions {
    counts: HashMap<(String, String), u64>,
    failing_orgs: HashSet<String>,
    authentications: Mutex<Vec<String>>,
    queries: Mutex<Vec<(String, String)>>,
    token_requests: Mutex<Vec<String>>,
}

impl FakeActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, org: &str, repo: &str, count: u64) -> Self {
        self.counts.insert((org.to_string(), repo.to_string()), count);
        self
    }

    /// Every call for `org` fails, as if its authentication were broken
    pub fn failing(mut self, org: &str) -> Self {
        self.failing_orgs.insert(org.to_string());
        self
    }

    pub fn authentications(&self) -> Vec<String> {
        self.authentications.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(String, String)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn queries_for(&self, org: &str) -> usize {
        self.queries().iter().filter(|(o, _)| o == org).count()
    }

    pub fn token_requests(&self) -> Vec<String> {
        self.token_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionsRepository for FakeActions {
    async fn authenticate(&self, org: &str) -> anyhow::Result<()> {
        self.authentications.lock().unwrap().push(org.to_string());

        if self.failing_orgs.contains(org) {
            anyhow::bail!("Failed to authenticate for organisation {}", org);
        }

        Ok(())
    }

    async fn queued_run_count(&self, org: &str, repo: &str) -> anyhow::Result<u64> {
        self.queries
            .lock()
            .unwrap()
            .push((org.to_string(), repo.to_string()));

        if self.failing_orgs.contains(org) {
            anyhow::bail!("Failed to authenticate for organisation {}", org);
        }

        Ok(self
            .counts
            .get(&(org.to_string(), repo.to_string()))
            .copied()
            .unwrap_or(0))
    }

    async fn registration_token(&self, org: &str) -> anyhow::Result<String> {
        self.token_requests.lock().unwrap().push(org.to_string());

        if self.failing_orgs.contains(org) {
            anyhow::bail!("Failed to create registration token for {}", org);
        }

        Ok(format!("reg-{}", org))
    }
}

/// One call made on a [`RecordingAgent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCall {
    Deregister,
    Register { url: String, token: String },
    Run,
}

/// Runner agent that records calls and can be told to fail or to raise a
/// stop signal while "running"
#[derive(Default)]
pub struct RecordingAgent {
    calls: Mutex<Vec<AgentCall>>,
    fail_deregister: bool,
    fail_run: bool,
    stop_on_run: Option<Arc<FlagStop>>,
}

impl RecordingAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_deregister(mut self) -> Self {
        self.fail_deregister = true;
        self
    }

    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    pub fn raising_stop_on_run(mut self, stop: Arc<FlagStop>) -> Self {
        self.stop_on_run = Some(stop);
        self
    }

    pub fn calls(&self) -> Vec<AgentCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn runs(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == AgentCall::Run)
            .count()
    }

    fn record(&self, call: AgentCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RunnerAgent for RecordingAgent {
    async fn deregister(&self) -> Result<(), AgentError> {
        self.record(AgentCall::Deregister);
        if self.fail_deregister {
            return Err(AgentError::ExitStatus {
                script: "config.sh".to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }

    async fn register(&self, url: &str, token: &str) -> Result<(), AgentError> {
        self.record(AgentCall::Register {
            url: url.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }

    async fn run(&self) -> Result<(), AgentError> {
        self.record(AgentCall::Run);
        if let Some(stop) = &self.stop_on_run {
            stop.raise();
        }
        if self.fail_run {
            return Err(AgentError::ExitStatus {
                script: "run.sh".to_string(),
                code: Some(2),
            });
        }
        Ok(())
    }
}

/// Stop signal raised explicitly, e.g. from inside another fake
#[derive(Default)]
pub struct FlagStop {
    raised: AtomicBool,
}

impl FlagStop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }
}

impl StopSignal for FlagStop {
    fn should_stop(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Stop signal that fires on its n-th check (1-based) and every check after
pub struct StopAfter {
    checks: AtomicUsize,
    fire_at: usize,
}

impl StopAfter {
    pub fn new(fire_at: usize) -> Self {
        Self {
            checks: AtomicUsize::new(0),
            fire_at,
        }
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl StopSignal for StopAfter {
    fn should_stop(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst) + 1 >= self.fire_at
    }
}
