//! AWS CLI error categorization for multi-region aggregation.
//!
//! The CLI reports failures only as text on stderr, so the split between a
//! region we can skip and a failure that must abort the request is made here,
//! once, when the executor turns a failed process into a [`CliError`]. Callers
//! match on the variant instead of re-inspecting message text.
//!
//! If the CLI ever changes the wording of its credential or endpoint errors,
//! [`SKIPPABLE_PATTERNS`] is the only place that needs to follow.

use std::time::Duration;
use thiserror::Error;

/// Lowercased fragments of CLI error output that mean "this region is not
/// usable with the current credentials", as opposed to a real failure.
pub const SKIPPABLE_PATTERNS: &[&str] = &[
    "authfailure",
    "not able to validate the provided access credentials",
    "invalidclienttokenid",
    "could not connect to the endpoint url",
];

/// Errors produced by the external command executor and everything built on it.
#[derive(Debug, Error)]
pub enum CliError {
    /// Credential rejection or unreachable regional endpoint. Aggregation
    /// across regions records the region and carries on.
    #[error("aws cli error: {message}")]
    Skippable { message: String },

    /// Any other non-zero exit of the CLI.
    #[error("aws cli error: {message}")]
    Command { message: String },

    /// The CLI binary could not be started at all.
    #[error("failed to run aws cli: {0}")]
    Spawn(#[source] std::io::Error),

    /// The CLI succeeded but its output did not have the expected shape.
    #[error("failed to parse {operation} output: {source}")]
    Parse {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    /// The call outlived its deadline and was killed.
    #[error("aws cli call timed out after {0:?}")]
    DeadlineExceeded(Duration),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// A region worker died without reporting a result.
    #[error("region worker failed: {0}")]
    Worker(String),
}

impl CliError {
    /// Build the error for a failed CLI invocation, classifying it by message.
    pub fn from_cli_output(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_skippable_message(&message) {
            CliError::Skippable { message }
        } else {
            CliError::Command { message }
        }
    }

    pub fn parse(operation: impl Into<String>, source: serde_json::Error) -> Self {
        CliError::Parse {
            operation: operation.into(),
            source,
        }
    }

    /// Returns true if a single region failing with this error should be
    /// skipped rather than failing the whole aggregation.
    pub fn is_skippable(&self) -> bool {
        matches!(self, CliError::Skippable { .. })
    }

    /// Short label for log lines
    pub fn short_label(&self) -> &'static str {
        match self {
            CliError::Skippable { .. } => "skipped",
            CliError::Command { .. } => "error",
            CliError::Spawn(_) => "spawn",
            CliError::Parse { .. } => "parse",
            CliError::DeadlineExceeded(_) => "timeout",
            CliError::Cancelled => "cancelled",
            CliError::Worker(_) => "worker",
        }
    }
}

/// Case-insensitive match of an error message against [`SKIPPABLE_PATTERNS`].
pub fn is_skippable_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    SKIPPABLE_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}
