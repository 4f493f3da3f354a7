//! Tool availability checks — is an external binary reachable?

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::process::Command;

/// Locate `tool` on the PATH from the given environment snapshot.
///
/// Names containing a path separator are checked directly instead of
/// searched. No process is spawned.
pub fn find_in_path(tool: &str, env: &HashMap<String, String>) -> Option<PathBuf> {
    if tool.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(tool);
        return is_executable(&candidate).then_some(candidate);
    }

    let path_var = env.get("PATH")?;
    for dir in std::env::split_paths(path_var) {
        let candidate = dir.join(tool);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{tool}.exe"));
            if is_executable(&exe) {
                return Some(exe);
            }
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Check whether `tool` is installed and reachable.
///
/// Fast path is a PATH lookup; if that fails, a lightweight probe is
/// spawned (`tool --version` on Unix, `where.exe tool` on Windows) and
/// a zero exit counts as present. Always returns a definite answer —
/// the second element is an empty string when installed, otherwise a
/// diagnostic.
pub async fn check_tool(tool: &str, env: &HashMap<String, String>) -> (bool, String) {
    if let Some(path) = find_in_path(tool, env) {
        tracing::debug!(tool, path = %path.display(), "found on PATH");
        return (true, String::new());
    }

    tracing::debug!(tool, "not on PATH, falling back to probe spawn");
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("where.exe");
        c.arg(tool);
        c
    } else {
        let mut c = Command::new(tool);
        c.arg("--version");
        c
    };

    match cmd.env_clear().envs(env).output().await {
        Ok(output) if output.status.success() => (true, String::new()),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            (
                false,
                format!(
                    "{tool} is not installed or not found in PATH: probe exited with {:?}: {}",
                    output.status.code(),
                    stderr.trim()
                ),
            )
        }
        Err(e) => (
            false,
            format!("{tool} is not installed or not found in PATH: {e}"),
        ),
    }
}
