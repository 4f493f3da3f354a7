//! Informational providers — read-only listings of modules, variables,
//! outputs, and providers.
//!
//! Prefers the CLI's machine-readable form where one exists
//! (`terraform output -json`), falling back to regex scans of the
//! workspace `*.tf` files. The fallback only recognizes declaration
//! headers; it is deliberately not an HCL parser.

use std::path::Path;
use std::time::Duration;

use regex::Regex;

use crate::error::{OpsError, OpsResult};
use crate::handler::TerraformHandler;
use crate::workspace;

/// Timeout for the speculative `terraform console` value probe.
const CONSOLE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

const VARIABLE_PATTERN: &str = r#"variable\s+"([^"]+)"\s*\{"#;
const PROVIDER_PATTERN: &str = r#"provider\s+"([^"]+)"\s*\{"#;

impl TerraformHandler {
    /// Modules referenced by the current state, derived from
    /// `terraform state list` resource addresses.
    pub async fn list_modules(&self) -> String {
        match self.runner().run(&["state", "list"]).await {
            Ok(output) => {
                let modules = parse_module_names(&output.stdout);
                if modules.is_empty() {
                    "No modules found in the current Terraform state.".to_string()
                } else {
                    let mut text = String::from("Terraform modules in use:");
                    for module in modules {
                        text.push_str(&format!("\n- {module}"));
                    }
                    text
                }
            }
            Err(e) => format!("Error listing Terraform modules: {e}"),
        }
    }

    /// Variables declared in the workspace `*.tf` files, with
    /// best-effort current values probed via `terraform console`.
    pub async fn list_variables(&self) -> String {
        if workspace::tf_files(self.workspace()).is_empty() {
            return "No Terraform (.tf) files found in the workspace.".to_string();
        }
        let names = match scan_declarations(self.workspace(), VARIABLE_PATTERN) {
            Ok(names) => names,
            Err(e) => return format!("Error retrieving Terraform variables: {e}"),
        };
        if names.is_empty() {
            return "No variables found in the Terraform configuration files.".to_string();
        }

        let mut text = String::from("Terraform variables defined in the project:");
        for name in &names {
            match self.probe_variable_value(name).await {
                Some(value) => text.push_str(&format!("\n- {name} = {value}")),
                None => text.push_str(&format!("\n- {name}")),
            }
        }
        text
    }

    /// Evaluate `var.<name>` through `terraform console` under a short
    /// timeout. Expiry or failure is silently discarded — the listing
    /// then shows the bare name.
    async fn probe_variable_value(&self, name: &str) -> Option<String> {
        let expr = format!("var.{name}\n");
        match self
            .runner()
            .run_with_stdin_timeout(&["console"], &expr, CONSOLE_PROBE_TIMEOUT)
            .await
        {
            Ok(output) => {
                let value = output.stdout.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            Err(e) => {
                tracing::debug!(variable = name, error = %e, "console probe discarded");
                None
            }
        }
    }

    /// Outputs from the state via `terraform output -json`; malformed
    /// JSON degrades to the raw text with an annotation.
    pub async fn list_outputs(&self) -> String {
        match self.runner().run(&["output", "-json"]).await {
            Ok(output) => {
                let raw = output.stdout.trim();
                if raw.is_empty() {
                    return "No outputs found in the Terraform state.".to_string();
                }
                match render_outputs_json(raw) {
                    Ok(text) => text,
                    Err(_) => format!(
                        "Error parsing Terraform outputs: invalid JSON format\n\nRaw output:\n{raw}"
                    ),
                }
            }
            Err(e) => format!("Error retrieving Terraform outputs: {e}"),
        }
    }

    /// Providers via `terraform providers`, falling back to scanning
    /// `provider "..." {` headers when the CLI call fails.
    pub async fn list_providers(&self) -> String {
        let cli_error = match self.runner().run(&["providers"]).await {
            Ok(output) => {
                let report = output.stdout.trim();
                if report.is_empty() {
                    return "No provider information available.".to_string();
                }
                return format!("Terraform providers:\n\n{report}");
            }
            Err(e) => e,
        };

        match scan_declarations(self.workspace(), PROVIDER_PATTERN) {
            Ok(providers) if providers.is_empty() => {
                "No providers found in the Terraform configuration files.".to_string()
            }
            Ok(providers) => {
                let mut text = String::from("Terraform providers in use:");
                for provider in providers {
                    text.push_str(&format!("\n- {provider}"));
                }
                text
            }
            Err(e) => format!(
                "Error retrieving Terraform providers: {cli_error}\nFallback method also failed: {e}"
            ),
        }
    }
}

/// Extract sorted, de-duplicated module names from `state list` output
/// (`module.<name>.<resource>` addresses).
pub fn parse_module_names(state_listing: &str) -> Vec<String> {
    let mut modules: Vec<String> = state_listing
        .lines()
        .filter_map(|line| {
            let mut parts = line.trim().split('.');
            match (parts.next(), parts.next()) {
                (Some("module"), Some(name)) if !name.is_empty() => Some(name.to_string()),
                _ => None,
            }
        })
        .collect();
    modules.sort();
    modules.dedup();
    modules
}

/// Scan the workspace `*.tf` files for declaration headers matching
/// `pattern` (first capture group is the name). Sorted, de-duplicated.
pub fn scan_declarations(dir: &Path, pattern: &str) -> OpsResult<Vec<String>> {
    let re = Regex::new(pattern).map_err(|e| OpsError::Parse(e.to_string()))?;
    let mut names = Vec::new();
    for file in workspace::tf_files(dir) {
        let content = std::fs::read_to_string(&file)
            .map_err(|e| OpsError::Io(format!("{}: {e}", file.display())))?;
        names.extend(
            re.captures_iter(&content)
                .map(|c| c[1].to_string()),
        );
    }
    names.sort();
    names.dedup();
    Ok(names)
}

/// Render `terraform output -json` into the listing text.
pub fn render_outputs_json(raw: &str) -> OpsResult<String> {
    let outputs: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| OpsError::Parse(e.to_string()))?;

    let mut text = String::from("Terraform outputs:");
    for (name, data) in &outputs {
        let value = data.get("value").cloned().unwrap_or_default();
        let rendered = match &value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::to_string_pretty(&value)
                    .map_err(|e| OpsError::Parse(e.to_string()))?
            }
            other => other.to_string(),
        };
        text.push_str(&format!("\n- {name} = {rendered}"));
    }
    Ok(text)
}
