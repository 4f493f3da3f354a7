//! Agent configuration, loadable from TOML with environment overrides.
//!
//! Everything is resolved exactly once at startup into an immutable
//! `AgentConfig`; no component reads the process environment after
//! that — the frozen snapshot travels with the config.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

/// Optional on-disk configuration (first CLI argument).
///
/// Environment variables win over file values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Root of the project the agent serves.
    #[serde(default)]
    pub project_root: Option<String>,
    /// Explicit Terraform workspace directory.
    #[serde(default)]
    pub workspace: Option<String>,
    /// Directory for agent log artifacts.
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Terraform binary name or path (defaults to "terraform").
    #[serde(default)]
    pub terraform_binary: Option<String>,
}

impl ConfigFile {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// Fully resolved, immutable agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub project_root: PathBuf,
    pub workspace: PathBuf,
    pub log_dir: PathBuf,
    pub terraform_binary: String,
    /// Environment snapshot passed unmodified to every child process.
    pub env: HashMap<String, String>,
}

impl AgentConfig {
    /// Load from an optional TOML file path, then apply environment
    /// overrides and the workspace fallback chain.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let file = match config_path {
            Some(path) => ConfigFile::from_file(path)?,
            None => ConfigFile::default(),
        };
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::resolve(file, env)
    }

    /// Resolution order per field: env override → config file → default.
    pub fn resolve(file: ConfigFile, env: HashMap<String, String>) -> anyhow::Result<Self> {
        let project_root = match env.get("PROJECT_ROOT").cloned().or(file.project_root) {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir()?,
        };

        let workspace = match env.get("TERRAFORM_WORKSPACE").cloned().or(file.workspace) {
            Some(ws) => {
                tracing::info!(workspace = %ws, "using terraform workspace override");
                PathBuf::from(ws)
            }
            None => resolve_workspace(&project_root),
        };

        let log_dir = env
            .get("LOG_DIR")
            .cloned()
            .or(file.log_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| project_root.join("logs"));

        let terraform_binary = file
            .terraform_binary
            .unwrap_or_else(|| "terraform".to_string());

        Ok(Self {
            project_root,
            workspace,
            log_dir,
            terraform_binary,
            env,
        })
    }
}

/// Workspace fallback chain when no override is set: the conventional
/// sample subdirectory, then the directory of the first `main.tf`
/// found by recursive search, then the project root itself.
fn resolve_workspace(root: &Path) -> PathBuf {
    let sample = root.join("examples").join("sample_terraform");
    if sample.is_dir() {
        tracing::info!(workspace = %sample.display(), "found sample terraform directory");
        return sample;
    }

    let found = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == "main.tf")
        .and_then(|entry| entry.path().parent().map(Path::to_path_buf));
    if let Some(dir) = found {
        tracing::info!(workspace = %dir.display(), "found main.tf by recursive search");
        return dir;
    }

    tracing::info!(workspace = %root.display(), "no terraform directory found, using project root");
    root.to_path_buf()
}
