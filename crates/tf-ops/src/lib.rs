//! Terraform CLI operations for Terrapilot.
//!
//! Provides the process-spawning layer of the agent: tool availability
//! checks, workspace validation, a `CommandRunner` with a frozen
//! environment snapshot, output formatting, and the `TerraformHandler`
//! operation set (init, plan, apply, destroy, state list, show, drift,
//! cost, security) plus informational listings with regex fallbacks.

pub mod error;
pub mod exec;
pub mod format;
pub mod handler;
pub mod resources;
pub mod toolcheck;
pub mod types;
pub mod workspace;

// Re-export key types for convenience
pub use error::{OpsError, OpsResult};
pub use exec::CommandRunner;
pub use format::format_output;
pub use handler::TerraformHandler;
pub use types::{CommandOutput, Operation};
pub use workspace::validate_workspace;
