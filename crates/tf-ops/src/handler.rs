//! The Terraform operation handler set.
//!
//! Each operation builds an argument vector, delegates to the
//! `CommandRunner`, and renders the result as text. Operation failures
//! never cross the handler boundary — the caller always gets a string.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{OpsError, OpsResult};
use crate::exec::CommandRunner;
use crate::format::format_output;
use crate::toolcheck;
use crate::workspace;

/// Plan artifact file name inside the workspace.
pub const PLAN_OUT_FILE: &str = "tfplan";

/// Rendered plan graph file name inside the workspace.
pub const PLAN_GRAPH_FILE: &str = "terraform_plan.png";

/// Executes Terraform commands against one validated workspace.
///
/// Construction is the only fallible point: an invalid workspace or a
/// missing `terraform` binary aborts startup. After that every
/// operation returns a human-readable string in all cases.
#[derive(Debug)]
pub struct TerraformHandler {
    runner: CommandRunner,
    workspace: PathBuf,
    env: HashMap<String, String>,
}

impl TerraformHandler {
    /// Build a handler for the `terraform` binary on PATH.
    pub async fn new(
        workspace: impl Into<PathBuf>,
        env: HashMap<String, String>,
    ) -> OpsResult<Self> {
        Self::with_binary("terraform", workspace, env).await
    }

    /// Build a handler for an explicit binary name or path.
    pub async fn with_binary(
        binary: &str,
        workspace: impl Into<PathBuf>,
        env: HashMap<String, String>,
    ) -> OpsResult<Self> {
        let workspace = workspace.into();
        if !workspace::validate_workspace(&workspace) {
            return Err(OpsError::InvalidWorkspace(
                workspace.display().to_string(),
            ));
        }

        let (installed, detail) = toolcheck::check_tool(binary, &env).await;
        if !installed {
            return Err(OpsError::ToolNotInstalled {
                tool: binary.to_string(),
                detail,
            });
        }

        tracing::info!(
            binary,
            workspace = %workspace.display(),
            "terraform handler initialized"
        );
        Ok(Self {
            runner: CommandRunner::new(binary, workspace.clone(), env.clone()),
            workspace,
            env,
        })
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub(crate) fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Runner for an auxiliary tool (dot, infracost, tfsec) sharing the
    /// workspace and environment snapshot.
    pub(crate) fn aux_runner(&self, program: &str) -> CommandRunner {
        CommandRunner::new(program, self.workspace.clone(), self.env.clone())
    }

    /// `terraform init`
    pub async fn init(&self) -> String {
        self.run_formatted(&["init"], "terraform init").await
    }

    /// `terraform plan -out=tfplan`, plus a graph render when `dot` is
    /// available. A failed render annotates the result instead of
    /// discarding the plan.
    pub async fn plan(&self) -> String {
        let out_arg = format!("-out={PLAN_OUT_FILE}");
        let output = match self.runner.run(&["plan", &out_arg]).await {
            Ok(output) => output,
            Err(e) => return operation_error("generating plan", &e),
        };

        let (dot_installed, _) = toolcheck::check_tool("dot", &self.env).await;
        if !dot_installed {
            return format_output(&output.stdout, &output.stderr);
        }

        match self.render_plan_graph().await {
            Ok(()) => format_output(
                &format!(
                    "{}\n\nPlan visualization saved as {PLAN_GRAPH_FILE}",
                    output.stdout
                ),
                &output.stderr,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "plan graph rendering failed");
                format_output(
                    &format!("{}\n\nNote: Plan visualization failed", output.stdout),
                    &output.stderr,
                )
            }
        }
    }

    /// Two-stage pipeline: `terraform graph -type=plan tfplan` piped
    /// into `dot -Tpng`. Each stage's exit status is validated on its
    /// own — no shell in between.
    async fn render_plan_graph(&self) -> OpsResult<()> {
        let graph = self
            .runner
            .run(&["graph", "-type=plan", PLAN_OUT_FILE])
            .await?;
        self.aux_runner("dot")
            .run_with_stdin(&["-Tpng", "-o", PLAN_GRAPH_FILE], &graph.stdout)
            .await?;
        Ok(())
    }

    /// `terraform apply [-auto-approve]`
    pub async fn apply(&self, auto_approve: bool) -> String {
        let mut args = vec!["apply"];
        if auto_approve {
            args.push("-auto-approve");
        }
        match self.runner.run(&args).await {
            Ok(output) => format_output(&output.stdout, &output.stderr),
            Err(e) => operation_error("applying configuration", &e),
        }
    }

    /// `terraform destroy [-auto-approve]`
    pub async fn destroy(&self, auto_approve: bool) -> String {
        let mut args = vec!["destroy"];
        if auto_approve {
            args.push("-auto-approve");
        }
        match self.runner.run(&args).await {
            Ok(output) => format_output(&output.stdout, &output.stderr),
            Err(e) => operation_error("destroying infrastructure", &e),
        }
    }

    /// `terraform state list`; empty state is a sentinel, not an error.
    pub async fn state_list(&self) -> String {
        match self.runner.run(&["state", "list"]).await {
            Ok(output) => {
                let listing = output.stdout.trim();
                if listing.is_empty() {
                    "No resources found in the current state.".to_string()
                } else {
                    listing.to_string()
                }
            }
            Err(e) => operation_error("listing state", &e),
        }
    }

    /// `terraform show`
    pub async fn show(&self) -> String {
        match self.runner.run(&["show"]).await {
            Ok(output) => format_output(&output.stdout, &output.stderr),
            Err(e) => operation_error("showing state", &e),
        }
    }

    /// `terraform plan -detailed-exitcode` — exit 0 means no drift,
    /// exit 2 means the live infrastructure differs from the state.
    pub async fn drift_check(&self) -> String {
        match self
            .runner
            .run_unchecked(&["plan", "-detailed-exitcode"])
            .await
        {
            Ok(output) => match output.exit_code {
                Some(0) => {
                    "No drift detected. The infrastructure matches the configuration."
                        .to_string()
                }
                Some(2) => format!(
                    "Drift detected! The current infrastructure state differs from the configuration:\n\n{}",
                    output.stdout.trim()
                ),
                _ => format!("Error checking for drift: {}", output.stderr.trim()),
            },
            Err(e) => operation_error("checking for drift", &e),
        }
    }

    /// `infracost breakdown --path .` — degrades to an install hint
    /// when infracost is absent.
    pub async fn cost_estimate(&self) -> String {
        let (installed, _) = toolcheck::check_tool("infracost", &self.env).await;
        if !installed {
            return "Error: 'infracost' is required for cost estimation but was not found. \
                    Please install it from https://www.infracost.io/docs/"
                .to_string();
        }
        match self
            .aux_runner("infracost")
            .run(&["breakdown", "--path", "."])
            .await
        {
            Ok(output) => format!("Cost estimation:\n\n{}", output.stdout.trim()),
            Err(e) => operation_error("estimating costs", &e),
        }
    }

    /// `tfsec .` — a non-zero exit with findings is still a report,
    /// not a failure.
    pub async fn security_scan(&self) -> String {
        let (installed, _) = toolcheck::check_tool("tfsec", &self.env).await;
        if !installed {
            return "Error: 'tfsec' is required for security analysis but was not found. \
                    Please install it from https://github.com/aquasecurity/tfsec"
                .to_string();
        }
        match self.aux_runner("tfsec").run_unchecked(&["."]).await {
            Ok(output) => {
                let report = output.stdout.trim();
                if output.success() && report.is_empty() {
                    "No security issues found in the configuration.".to_string()
                } else if report.is_empty() {
                    format!("Error running security scan: {}", output.stderr.trim())
                } else {
                    format!("Security analysis results:\n\n{report}")
                }
            }
            Err(e) => operation_error("running security scan", &e),
        }
    }

    /// Workspace access probe plus `terraform version`.
    pub async fn status(&self) -> String {
        let version = match self.runner.run(&["version"]).await {
            Ok(output) => output.stdout.trim().to_string(),
            Err(e) => format!("terraform version unavailable: {e}"),
        };
        format!(
            "Workspace: {}\n{version}",
            self.workspace.display()
        )
    }

    /// Execute an explicit argument vector verbatim (pass-through for
    /// queries no keyword rule matched).
    pub async fn raw(&self, args: &[String]) -> String {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        match self.runner.run(&arg_refs).await {
            Ok(output) => format!(
                "Command output:\n\n{}",
                format_output(&output.stdout, &output.stderr)
            ),
            Err(e) => operation_error("executing command", &e),
        }
    }

    async fn run_formatted(&self, args: &[&str], context: &str) -> String {
        match self.runner.run(args).await {
            Ok(output) => format_output(&output.stdout, &output.stderr),
            Err(e) => {
                tracing::warn!(context, error = %e, "operation failed");
                format!("Error during {context}: {e}")
            }
        }
    }
}

fn operation_error(context: &str, e: &OpsError) -> String {
    tracing::warn!(context, error = %e, "operation failed");
    format!("Error {context}: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn env_snapshot() -> HashMap<String, String> {
        std::env::vars().collect()
    }

    fn tf_workspace() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("main.tf"),
            "resource \"null_resource\" \"example\" {}\n",
        )
        .unwrap();
        tmp
    }

    /// Write a stand-in terraform binary that echoes its arguments.
    #[cfg(unix)]
    fn fake_terraform(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("terraform");
        fs::write(&path, "#!/bin/sh\necho \"terraform $@\"\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn construction_fails_on_invalid_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let empty = tmp.path().join("empty");
        fs::create_dir(&empty).unwrap();
        let err = TerraformHandler::new(&empty, env_snapshot())
            .await
            .unwrap_err();
        assert!(matches!(err, OpsError::InvalidWorkspace(_)));
    }

    #[tokio::test]
    async fn construction_fails_on_missing_binary() {
        let ws = tf_workspace();
        let err = TerraformHandler::with_binary(
            "definitely-not-a-real-binary-7f3a",
            ws.path(),
            env_snapshot(),
        )
        .await
        .unwrap_err();
        match err {
            OpsError::ToolNotInstalled { tool, detail } => {
                assert_eq!(tool, "definitely-not-a-real-binary-7f3a");
                assert!(!detail.is_empty());
            }
            other => panic!("expected ToolNotInstalled, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn init_runs_and_formats_output() {
        let ws = tf_workspace();
        let binary = fake_terraform(ws.path());
        let handler =
            TerraformHandler::with_binary(binary.to_str().unwrap(), ws.path(), env_snapshot())
                .await
                .unwrap();
        let text = handler.init().await;
        assert_eq!(text, "terraform init");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn apply_with_auto_approve_suppresses_prompt() {
        let ws = tf_workspace();
        let binary = fake_terraform(ws.path());
        let handler =
            TerraformHandler::with_binary(binary.to_str().unwrap(), ws.path(), env_snapshot())
                .await
                .unwrap();
        let text = handler.apply(true).await;
        assert!(text.contains("apply -auto-approve"), "got: {text}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn state_list_empty_output_yields_sentinel() {
        use std::os::unix::fs::PermissionsExt;
        let ws = tf_workspace();
        let binary = ws.path().join("terraform");
        fs::write(&binary, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
        let handler =
            TerraformHandler::with_binary(binary.to_str().unwrap(), ws.path(), env_snapshot())
                .await
                .unwrap();
        assert_eq!(
            handler.state_list().await,
            "No resources found in the current state."
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_command_surfaces_stderr_text() {
        use std::os::unix::fs::PermissionsExt;
        let ws = tf_workspace();
        let binary = ws.path().join("terraform");
        fs::write(&binary, "#!/bin/sh\necho \"lock held by someone\" >&2\nexit 1\n").unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();
        let handler =
            TerraformHandler::with_binary(binary.to_str().unwrap(), ws.path(), env_snapshot())
                .await
                .unwrap();
        let text = handler.destroy(true).await;
        assert!(text.contains("lock held by someone"), "got: {text}");
        assert!(text.starts_with("Error destroying infrastructure"));
    }
}
