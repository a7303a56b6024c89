//! AWS CLI command execution.
//!
//! Every piece of data the dashboard shows comes from running `aws ... --output json`
//! as a child process. The [`CliExecutor`] trait is the seam the rest of the crate
//! depends on so aggregation and projection can be driven by a stub in tests.
//!
//! # Security
//!
//! Credentials for custom profiles are passed to the CLI via environment variables
//! in the spawned process, never written to the command line or logged.

use super::cli_errors::CliError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Source of environment overrides applied to every CLI invocation.
///
/// The profile manager implements this so the executor picks up whichever
/// credentials are active at call time.
pub trait CliEnvironment: Send + Sync {
    fn active_env(&self) -> Vec<(String, String)>;

    /// Id of the active profile, used to scope cached responses.
    fn active_profile(&self) -> Option<String> {
        None
    }
}

/// Runs read-only AWS CLI operations and returns their JSON output.
#[async_trait]
pub trait CliExecutor: Send + Sync {
    /// Run `aws <args> --output json`. The call must stop promptly when
    /// `cancel` fires.
    async fn run_json(&self, args: &[String], cancel: &CancellationToken)
        -> Result<Vec<u8>, CliError>;
}

/// [`CliExecutor`] backed by the real `aws` binary.
pub struct AwsCliExecutor {
    binary: PathBuf,
    timeout: Duration,
    environment: Option<Arc<dyn CliEnvironment>>,
}

impl AwsCliExecutor {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            environment: None,
        }
    }

    /// Apply the active profile's environment to every call.
    pub fn with_environment(mut self, environment: Arc<dyn CliEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Run a command with an explicit environment, ignoring the active profile.
    /// Used to validate credentials before they are stored.
    pub async fn run_json_with_env(
        &self,
        args: &[String],
        env: &[(String, String)],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CliError> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .args(["--output", "json"])
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let command_line = format!("aws {}", args.join(" "));
        debug!("[CLI] Executing: {}", command_line);
        let start = Instant::now();

        let child = command.spawn().map_err(CliError::Spawn)?;

        // Dropping the wait future kills the child (kill_on_drop).
        let output = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("[CLI] Cancelled: {}", command_line);
                return Err(CliError::Cancelled);
            }
            result = tokio::time::timeout(self.timeout, child.wait_with_output()) => {
                match result {
                    Ok(output) => output.map_err(CliError::Spawn)?,
                    Err(_) => {
                        warn!("[CLI] Timed out after {:?}: {}", self.timeout, command_line);
                        return Err(CliError::DeadlineExceeded(self.timeout));
                    }
                }
            }
        };

        let duration_ms = start.elapsed().as_millis();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            debug!("[CLI] Command failed after {}ms: {}", duration_ms, command_line);
            return Err(CliError::from_cli_output(message));
        }

        debug!(
            "[CLI] Response: {}ms, {} bytes for {}",
            duration_ms,
            output.stdout.len(),
            command_line
        );
        Ok(output.stdout)
    }
}

#[async_trait]
impl CliExecutor for AwsCliExecutor {
    async fn run_json(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, CliError> {
        let env = self
            .environment
            .as_ref()
            .map(|e| e.active_env())
            .unwrap_or_default();
        self.run_json_with_env(args, &env, cancel).await
    }
}

/// Convenience for building argument vectors from string literals.
pub fn cli_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
