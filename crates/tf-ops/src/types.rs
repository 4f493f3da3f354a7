//! Core operation types shared between the ops layer and the agent.

use serde::{Deserialize, Serialize};

/// The closed set of operations the dispatcher can trigger.
///
/// Declaration order here is independent of dispatch priority — the
/// keyword rule table in the agent owns ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Init,
    Plan,
    Apply,
    Destroy,
    StateList,
    Show,
    DriftCheck,
    CostEstimate,
    SecurityScan,
    ListModules,
    ListVariables,
    ListOutputs,
    ListProviders,
    Status,
    Help,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
            Self::StateList => "state_list",
            Self::Show => "show",
            Self::DriftCheck => "drift_check",
            Self::CostEstimate => "cost_estimate",
            Self::SecurityScan => "security_scan",
            Self::ListModules => "list_modules",
            Self::ListVariables => "list_variables",
            Self::ListOutputs => "list_outputs",
            Self::ListProviders => "list_providers",
            Self::Status => "status",
            Self::Help => "help",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured result of one child-process invocation.
///
/// Transient — consumed by the formatter right after the process exits.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serde_snake_case() {
        let json = serde_json::to_string(&Operation::StateList).unwrap();
        assert_eq!(json, "\"state_list\"");
        let op: Operation = serde_json::from_str("\"drift_check\"").unwrap();
        assert_eq!(op, Operation::DriftCheck);
    }

    #[test]
    fn success_requires_zero_exit() {
        let ok = CommandOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());

        let drift = CommandOutput {
            exit_code: Some(2),
            ..ok.clone()
        };
        assert!(!drift.success());

        let signalled = CommandOutput {
            exit_code: None,
            ..ok
        };
        assert!(!signalled.success());
    }
}
