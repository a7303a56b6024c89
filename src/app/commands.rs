//! Read-only AWS CLI commands runnable from the dashboard.
//!
//! A fixed catalogue is loaded from `command-config.json`; the browser only
//! ever sees ids and labels, never the argument lists. Free-form commands go
//! through [`is_safe_args`], a conservative blocklist of mutating verbs.

use crate::app::resource_explorer::cli_errors::CliError;
use crate::app::resource_explorer::cli_executor::CliExecutor;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Lowercased fragments that mark a command as mutating. Each starts with a
/// space so only whole verbs after the service name match.
const BLOCKED_FRAGMENTS: &[&str] = &[
    " delete-",
    " delete",
    " terminate-",
    " terminate",
    " stop-",
    " stop ",
    " start-",
    " start ",
    " reboot-",
    " reboot",
    " destroy",
    " drop-",
    " modify-",
    " update-",
    " put-",
    " create-",
    " attach-",
    " detach-",
];

/// One catalogue entry as written in the config file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub supports_region: bool,
}

/// Catalogue entry without its arguments, for the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCommand {
    pub id: String,
    pub label: String,
    pub description: String,
    pub service: String,
    pub supports_region: bool,
}

/// Result of a command: the rendered command line and its JSON output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    pub command: String,
    pub output: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command id \"{0}\"")]
    UnknownCommand(String),

    #[error("no arguments provided")]
    NoArguments,

    #[error("command blocked by safety filter")]
    Blocked,

    #[error(transparent)]
    Cli(#[from] CliError),
}

impl CommandError {
    /// The CLI rejected the command line itself rather than failing to run it
    pub fn is_usage_error(&self) -> bool {
        let message = self.to_string();
        message.contains("usage: aws") || message.contains("argument command: Invalid choice")
    }
}

/// Split a free-form command line on whitespace
pub fn split_raw_args(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// True when no blocked fragment appears in the lowercased command line.
/// An empty command is never safe.
pub fn is_safe_args(args: &[String]) -> bool {
    if args.is_empty() {
        return false;
    }
    let joined = args.join(" ").to_lowercase();
    !BLOCKED_FRAGMENTS
        .iter()
        .any(|fragment| joined.contains(fragment))
}

pub struct CommandCatalogue {
    executor: Arc<dyn CliExecutor>,
    commands: HashMap<String, CommandDefinition>,
}

impl CommandCatalogue {
    pub fn empty(executor: Arc<dyn CliExecutor>) -> Self {
        Self {
            executor,
            commands: HashMap::new(),
        }
    }

    /// Load the catalogue from a JSON list. A missing file is an empty
    /// catalogue; entries without an id or arguments are dropped.
    pub fn load(path: &Path, executor: Arc<dyn CliExecutor>) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No command config at {}, catalogue is empty", path.display());
                return Ok(Self::empty(executor));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read command config {}", path.display()));
            }
        };

        let definitions: Vec<CommandDefinition> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse command config {}", path.display()))?;

        let commands: HashMap<String, CommandDefinition> = definitions
            .into_iter()
            .filter(|c| !c.id.is_empty() && !c.args.is_empty())
            .map(|c| (c.id.clone(), c))
            .collect();

        info!(
            "Loaded {} commands from {}",
            commands.len(),
            path.display()
        );
        Ok(Self { executor, commands })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Public metadata sorted by id
    pub fn list(&self) -> Vec<PublicCommand> {
        let mut list: Vec<PublicCommand> = self
            .commands
            .values()
            .map(|c| PublicCommand {
                id: c.id.clone(),
                label: c.label.clone(),
                description: c.description.clone(),
                service: c.service.clone(),
                supports_region: c.supports_region,
            })
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Run a catalogue command, adding `--region` when it supports one.
    pub async fn execute(
        &self,
        id: &str,
        region: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        let definition = self
            .commands
            .get(id)
            .ok_or_else(|| CommandError::UnknownCommand(id.to_string()))?;

        let mut args = definition.args.clone();
        let region = region.trim();
        if definition.supports_region && !region.is_empty() {
            args.push("--region".to_string());
            args.push(region.to_string());
        }

        self.run(args, cancel).await
    }

    /// Run a free-form command after the safety filter.
    pub async fn execute_raw(
        &self,
        args: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        if args.is_empty() {
            return Err(CommandError::NoArguments);
        }
        if !is_safe_args(&args) {
            log_warn!("Blocked raw command: aws {}", args.join(" "));
            return Err(CommandError::Blocked);
        }

        self.run(args, cancel).await
    }

    async fn run(
        &self,
        args: Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, CommandError> {
        let raw = self.executor.run_json(&args, cancel).await?;

        // Some read operations print nothing at all on success
        let output = if raw.iter().all(u8::is_ascii_whitespace) {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&raw).map_err(|e| CliError::parse(args.join(" "), e))?
        };

        Ok(CommandOutput {
            command: format!("aws {}", args.join(" ")),
            output,
        })
    }
}
