//! Failure kinds and actionable error formatting.
//!
//! `PublishError` is the typed failure surfaced by the library. Each variant
//! knows whether it is worth retrying and which exit code it maps to.
//! `ActionableError` renders a failure for humans with:
//! - Clear error description
//! - Possible causes (diagnostics)
//! - Remediation steps (actionable fixes)

use crate::output::ExitCode;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a publish run.
///
/// Missing image files are not represented here: they are collected as
/// [`MissingAsset`](crate::document::MissingAsset) records and reported as
/// warnings.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("File not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("'{tool}' is required but was not found in PATH")]
    ToolMissing { tool: String },

    #[error("Authentication failed running '{command}': {message}")]
    RemoteAuth { command: String, message: String },

    #[error("Transient transport failure running '{command}': {message}")]
    TransientTransport { command: String, message: String },

    #[error("Giving up after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<PublishError>,
    },

    #[error("Gist {id} was created but not finalized ({stage} failed): {source}")]
    RemoteStateInconsistent {
        id: String,
        url: String,
        stage: &'static str,
        #[source]
        source: Box<PublishError>,
    },

    #[error("Command failed: {command}: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Unexpected response from '{command}': {output}")]
    UnexpectedResponse { command: String, output: String },

    #[error("Command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Whether the failure is a network blip that a retry may clear.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PublishError::TransientTransport { .. } | PublishError::Timeout { .. }
        )
    }

    /// Whether the failure is a credential or permission rejection.
    pub fn is_auth(&self) -> bool {
        match self {
            PublishError::RemoteAuth { .. } => true,
            PublishError::RetriesExhausted { source, .. }
            | PublishError::RemoteStateInconsistent { source, .. } => source.is_auth(),
            _ => false,
        }
    }

    /// Exit code for the command-line surface.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            PublishError::InputNotFound { .. } => ExitCode::NotFound,
            PublishError::RemoteAuth { .. } => ExitCode::PermissionDenied,
            PublishError::RemoteStateInconsistent { source, .. }
            | PublishError::RetriesExhausted { source, .. } => match source.exit_code() {
                ExitCode::PermissionDenied => ExitCode::PermissionDenied,
                _ => ExitCode::ExternalError,
            },
            PublishError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                ExitCode::PermissionDenied
            }
            _ => ExitCode::ExternalError,
        }
    }

    /// Stable machine-readable code used in JSON error output.
    pub fn code(&self) -> &'static str {
        match self {
            PublishError::InputNotFound { .. } => "INPUT_NOT_FOUND",
            PublishError::ToolMissing { .. } => "TOOL_MISSING",
            PublishError::RemoteAuth { .. } => "REMOTE_AUTH",
            PublishError::TransientTransport { .. } => "TRANSIENT_TRANSPORT",
            PublishError::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            PublishError::RemoteStateInconsistent { .. } => "REMOTE_STATE_INCONSISTENT",
            PublishError::CommandFailed { .. } => "COMMAND_FAILED",
            PublishError::UnexpectedResponse { .. } => "UNEXPECTED_RESPONSE",
            PublishError::Timeout { .. } => "TIMEOUT",
            PublishError::Io(_) => "IO_ERROR",
        }
    }

    /// Build the human-facing rendering with causes and remedies.
    pub fn actionable(&self) -> ActionableError {
        match self {
            PublishError::InputNotFound { path } => {
                ActionableError::new(self.to_string())
                    .with_cause("The path may be misspelled or relative to a different directory")
                    .with_remedy(format!("Check the file exists: ls -l {}", path.display()))
            }
            PublishError::ToolMissing { tool } => tool_missing(tool),
            PublishError::RemoteAuth { .. } => not_authenticated(&self.to_string()),
            PublishError::RemoteStateInconsistent { id, url, .. } => {
                not_finalized(id, url, &self.to_string())
            }
            PublishError::RetriesExhausted { .. } | PublishError::TransientTransport { .. } => {
                ActionableError::new(self.to_string())
                    .with_cause("The network connection to GitHub may be unstable")
                    .with_remedy("Check connectivity: gh api rate_limit")
                    .with_remedy("Raise [push] max_attempts in the config file and retry")
            }
            PublishError::Timeout { .. } => ActionableError::new(self.to_string())
                .with_cause("The remote may be slow or unreachable")
                .with_remedy("Raise [tools] timeout_seconds in the config file"),
            _ => ActionableError::new(self.to_string()),
        }
    }
}

/// An error with diagnostic context and remediation steps.
///
/// # Example
///
/// ```
/// use gist_publish::errors::ActionableError;
///
/// let error = ActionableError::new("Gist abc123 was created but not finalized")
///     .with_cause("The network dropped while updating the gist")
///     .with_remedy("Edit the gist manually: gh gist edit abc123");
///
/// assert!(error.to_error_message().contains("To fix:"));
/// ```
#[derive(Debug, Clone)]
pub struct ActionableError {
    error: String,
    causes: Vec<String>,
    remediation: Vec<String>,
}

impl ActionableError {
    /// Create a new actionable error with the given message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            causes: Vec::new(),
            remediation: Vec::new(),
        }
    }

    /// Add a possible cause (diagnostic hint).
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Add a remediation step (actionable fix).
    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remediation.push(remedy.into());
        self
    }

    pub fn remedies(&self) -> &[String] {
        &self.remediation
    }

    /// Convert to a formatted error message suitable for display.
    pub fn to_error_message(&self) -> String {
        let mut msg = format!("Error: {}\n", self.error);

        if !self.causes.is_empty() {
            msg.push_str("\nPossible causes:\n");
            for cause in &self.causes {
                msg.push_str(&format!("  • {}\n", cause));
            }
        }

        if !self.remediation.is_empty() {
            msg.push_str("\nTo fix:\n");
            for remedy in &self.remediation {
                msg.push_str(&format!("  • {}\n", remedy));
            }
        }

        msg
    }
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error_message())
    }
}

impl std::error::Error for ActionableError {}

/// Helper for a required external program that is not installed.
pub fn tool_missing(tool: &str) -> ActionableError {
    ActionableError::new(format!("'{}' is required but was not found in PATH", tool))
        .with_cause(format!("{} is not installed", tool))
        .with_cause("The [tools] section of the config file may point at a wrong path")
        .with_remedy(match tool {
            "gh" => "Install the GitHub CLI: https://cli.github.com".to_string(),
            _ => format!("Install {} and make sure it is on PATH", tool),
        })
}

/// Helper for credential rejection by the GitHub CLI or git.
pub fn not_authenticated(detail: &str) -> ActionableError {
    ActionableError::new(detail.to_string())
        .with_cause("The GitHub CLI is not logged in")
        .with_cause("The token may lack the 'gist' scope")
        .with_remedy("Log in: gh auth login")
        .with_remedy("Add the gist scope: gh auth refresh -s gist")
}

/// Helper for a gist that exists remotely but still holds the original text.
pub fn not_finalized(id: &str, url: &str, detail: &str) -> ActionableError {
    ActionableError::new(detail.to_string())
        .with_cause("The gist exists but its markdown still references local image paths")
        .with_remedy(format!("Inspect the gist: {}", url))
        .with_remedy(format!("Finish manually: gh gist edit {}", id))
        .with_remedy(format!("Or delete it and retry: gh gist delete {}", id))
}
