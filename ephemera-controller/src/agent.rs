//! Actions runner agent
//!
//! Wraps the runner's own scripts behind a three-operation interface:
//! - Removing any previous registration
//! - Registering an ephemeral, unattended runner against an organization
//! - Running the runner until its single job has finished
//!
//! Every call blocks until the script exits; none of them have a timeout.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;

/// Failure of one runner script invocation
#[derive(Debug, Error)]
pub enum AgentError {
    /// The script could not be started at all
    #[error("failed to start {script}: {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// The script ran and reported failure
    #[error("{script} exited with {}", describe_exit(.code))]
    ExitStatus { script: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Process boundary to the external runner agent
#[async_trait]
pub trait RunnerAgent: Send + Sync {
    /// Removes the current registration, if any
    async fn deregister(&self) -> Result<(), AgentError>;

    /// Registers an ephemeral runner against `url` using a registration token
    async fn register(&self, url: &str, token: &str) -> Result<(), AgentError>;

    /// Runs the registered runner until it has executed one job and exited
    async fn run(&self) -> Result<(), AgentError>;
}

/// Runner agent that shells out to an actions-runner installation
#[derive(Debug, Clone)]
pub struct ScriptRunnerAgent {
    runner_dir: PathBuf,
    config_script: String,
    run_script: String,
}

impl ScriptRunnerAgent {
    /// Creates an agent for the installation in `runner_dir`
    ///
    /// # Arguments
    /// * `runner_dir` - Directory the runner was unpacked into
    /// * `config_script` - Configuration entry point (usually `config.sh`)
    /// * `run_script` - Run entry point (usually `run.sh`)
    pub fn new(
        runner_dir: impl Into<PathBuf>,
        config_script: impl Into<String>,
        run_script: impl Into<String>,
    ) -> Self {
        Self {
            runner_dir: runner_dir.into(),
            config_script: config_script.into(),
            run_script: run_script.into(),
        }
    }

    /// Creates an agent from the controller configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.runner_dir.clone(),
            config.config_script.clone(),
            config.run_script.clone(),
        )
    }

    /// Runs one script from the runner directory and waits for it to exit
    ///
    /// The script is spawned as `./script` from inside `runner_dir`, so a
    /// relative `runner_dir` is resolved once against the controller's own
    /// working directory. Output is inherited so the runner's own logging
    /// reaches the controller's stdout. The child is killed if the controller
    /// is interrupted while waiting on it.
    async fn invoke(&self, script: &str, args: &[&str], shown_args: &str) -> Result<(), AgentError> {
        let program = Path::new(".").join(script);
        debug!("Running {} {} in {}", script, shown_args, self.runner_dir.display());

        let status = Command::new(&program)
            .args(args)
            .current_dir(&self.runner_dir)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| AgentError::Spawn {
                script: script.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(AgentError::ExitStatus {
                script: script.to_string(),
                code: status.code(),
            });
        }

        debug!("{} finished successfully", script);
        Ok(())
    }
}

#[async_trait]
impl RunnerAgent for ScriptRunnerAgent {
    async fn deregister(&self) -> Result<(), AgentError> {
        self.invoke(&self.config_script, &["remove"], "remove").await
    }

    async fn register(&self, url: &str, token: &str) -> Result<(), AgentError> {
        let shown = format!("--url {} --token <redacted> --ephemeral --unattended", url);
        self.invoke(
            &self.config_script,
            &["--url", url, "--token", token, "--ephemeral", "--unattended"],
            &shown,
        )
        .await
    }

    async fn run(&self) -> Result<(), AgentError> {
        self.invoke(&self.run_script, &[], "").await
    }
}
