//! Ephemera Controller
//!
//! Provisions ephemeral self-hosted GitHub Actions runners on demand.
//!
//! Architecture:
//! - Configuration: TOML file plus environment overrides, validated once
//! - Credentials: per-organization installation token cache
//! - Repositories: GitHub Actions API calls (queued runs, registration tokens)
//! - Services: queue scanning and runner lifecycle
//! - Scheduler: the poll, provision, wait loop
//!
//! The controller scans the configured organizations for queued workflow
//! runs, registers one ephemeral runner for each organization with work,
//! runs it to completion, and repeats until the stop file appears.

mod agent;
mod config;
mod credentials;
mod repository;
mod scheduler;
mod service;
mod stop;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use ephemera_client::{AppAuthenticator, AppCredentials, GitHubClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::agent::{RunnerAgent, ScriptRunnerAgent};
use crate::config::Config;
use crate::credentials::CredentialCache;
use crate::repository::{ActionsRepository, HttpActionsRepository};
use crate::scheduler::QueuePoller;
use crate::service::{QueueScanner, RunnerLifecycle};
use crate::stop::StopFile;

#[derive(Parser)]
#[command(name = "ephemera")]
#[command(about = "Provision ephemeral GitHub Actions runners on demand", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "EPHEMERA_CONFIG", default_value = "ephemera.toml")]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ephemera_controller=info,ephemera_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Starting Ephemera controller");

    let config = load_config(&cli.config)?;
    info!(
        "Loaded configuration: {} organisation(s), runner_dir={}",
        config.organizations.len(),
        config.runner_dir.display()
    );

    info!("Reading private key...");
    let pem = std::fs::read(&config.private_key_file).with_context(|| {
        format!(
            "Failed to read private key {}",
            config.private_key_file.display()
        )
    })?;
    let app_credentials = AppCredentials::new(config.client_id.clone(), &pem)
        .context("Failed to load GitHub App private key")?;

    // Wire up the layers
    let client = GitHubClient::new(config.api_url.clone());
    let authenticator = Arc::new(AppAuthenticator::new(client.clone(), app_credentials));
    let credentials = Arc::new(CredentialCache::new(authenticator));
    let repository: Arc<dyn ActionsRepository> =
        Arc::new(HttpActionsRepository::new(client, credentials));
    let agent: Arc<dyn RunnerAgent> = Arc::new(ScriptRunnerAgent::from_config(&config));
    let stop = StopFile::new(config.stop_file.clone());

    if let Some(path) = stop.path() {
        info!("Will exit once {} exists", path.display());
    }

    let mut poller = QueuePoller::new(
        config.organizations.clone(),
        config.poll_interval,
        QueueScanner::new(Arc::clone(&repository)),
        RunnerLifecycle::new(agent, repository, config.web_url.clone()),
        Arc::new(stop),
    );

    tokio::select! {
        checkpoint = poller.run() => {
            info!("Controller stopped {}", checkpoint);
        }
        _ = wait_for_interrupt() => {
            info!("Interrupted, exiting");
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C; if the handler cannot be installed, never resolves so
/// the stop file remains the only way out
async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupt: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Loads, overrides and validates the configuration file
fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::from_file(path)?;
    config.apply_env()?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
