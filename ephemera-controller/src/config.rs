//! Controller configuration
//!
//! Settings are read once at startup from a TOML file, optionally
//! overridden from the environment, validated, and never reloaded.

use anyhow::{Context, Result};
use ephemera_core::domain::organization::OrganizationConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_SECS: f64 = 30.0;
const DEFAULT_WEB_URL: &str = "https://github.com";
const DEFAULT_CONFIG_SCRIPT: &str = "config.sh";
const DEFAULT_RUN_SCRIPT: &str = "run.sh";

/// Controller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Organizations to register runners for, each with the repositories
    /// checked for queued jobs
    pub organizations: Vec<OrganizationConfig>,

    /// Client ID of the GitHub App
    pub client_id: String,

    /// File containing the app's PEM-encoded private key
    pub private_key_file: PathBuf,

    /// Directory where the actions runner is installed
    pub runner_dir: PathBuf,

    /// Pause between scan cycles; too short and the API rate limit bites
    pub poll_interval: Duration,

    /// Exit cleanly once this file exists
    pub stop_file: Option<PathBuf>,

    /// REST API base URL
    pub api_url: String,

    /// Web base URL runners register against
    pub web_url: String,

    /// Runner configuration script, relative to `runner_dir`
    pub config_script: String,

    /// Runner entry point, relative to `runner_dir`
    pub run_script: String,
}

/// On-disk layout of the configuration file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    organizations: Vec<OrganizationConfig>,
    client_id: String,
    private_key_file: PathBuf,
    runner_dir: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    poll_interval_secs: f64,
    #[serde(default)]
    stop_file: Option<PathBuf>,
    #[serde(default = "default_api_url")]
    api_url: String,
    #[serde(default = "default_web_url")]
    web_url: String,
    #[serde(default = "default_config_script")]
    config_script: String,
    #[serde(default = "default_run_script")]
    run_script: String,
}

fn default_poll_interval_secs() -> f64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_api_url() -> String {
    ephemera_client::DEFAULT_API_URL.to_string()
}

fn default_web_url() -> String {
    DEFAULT_WEB_URL.to_string()
}

fn default_config_script() -> String {
    DEFAULT_CONFIG_SCRIPT.to_string()
}

fn default_run_script() -> String {
    DEFAULT_RUN_SCRIPT.to_string()
}

impl Config {
    /// Loads configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parses configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)?;

        Ok(Self {
            organizations: file.organizations,
            client_id: file.client_id,
            private_key_file: file.private_key_file,
            runner_dir: file.runner_dir,
            poll_interval: parse_interval(file.poll_interval_secs)?,
            stop_file: file.stop_file,
            api_url: file.api_url,
            web_url: file.web_url,
            config_script: file.config_script,
            run_script: file.run_script,
        })
    }

    /// Applies overrides from environment variables
    ///
    /// Recognised variables:
    /// - EPHEMERA_CLIENT_ID
    /// - EPHEMERA_PRIVATE_KEY_FILE
    /// - EPHEMERA_RUNNER_DIR
    /// - EPHEMERA_POLL_INTERVAL (seconds)
    /// - EPHEMERA_STOP_FILE
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(client_id) = lookup("EPHEMERA_CLIENT_ID") {
            self.client_id = client_id;
        }

        if let Some(path) = lookup("EPHEMERA_PRIVATE_KEY_FILE") {
            self.private_key_file = PathBuf::from(path);
        }

        if let Some(path) = lookup("EPHEMERA_RUNNER_DIR") {
            self.runner_dir = PathBuf::from(path);
        }

        if let Some(secs) = lookup("EPHEMERA_POLL_INTERVAL") {
            let secs = secs
                .parse::<f64>()
                .with_context(|| format!("EPHEMERA_POLL_INTERVAL is not a number: {}", secs))?;
            self.poll_interval = parse_interval(secs)?;
        }

        if let Some(path) = lookup("EPHEMERA_STOP_FILE") {
            self.stop_file = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            anyhow::bail!("client_id cannot be empty");
        }

        if self.organizations.is_empty() {
            anyhow::bail!("at least one organization must be configured");
        }

        let mut seen = HashSet::new();
        for org in &self.organizations {
            if org.name.is_empty() {
                anyhow::bail!("organization name cannot be empty");
            }
            if !seen.insert(org.name.as_str()) {
                anyhow::bail!("organization {} is configured more than once", org.name);
            }
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        for (name, url) in [("api_url", &self.api_url), ("web_url", &self.web_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        Ok(())
    }
}

fn parse_interval(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| anyhow::anyhow!("poll interval must be a non-negative number of seconds"))
}
