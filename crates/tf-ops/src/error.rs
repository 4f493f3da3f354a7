//! Terraform operation error types.

use thiserror::Error;

/// Errors that can occur while preparing or running Terraform commands.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error("{tool} is not installed or not found in PATH: {detail}")]
    ToolNotInstalled { tool: String, detail: String },

    #[error("invalid Terraform workspace: {0}")]
    InvalidWorkspace(String),

    #[error("command exited with non-zero status: {stderr}")]
    CommandFailed { stderr: String },

    #[error("binary not found: {0}")]
    ToolNotFound(String),

    #[error("probe timed out after {0}s")]
    ProbeTimeout(u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Convenience alias for Terraform operation results.
pub type OpsResult<T> = Result<T, OpsError>;
