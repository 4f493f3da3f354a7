//! Output formatting for captured command streams.

/// Merge captured stdout and stderr into one user-facing string.
///
/// stdout alone when stderr is empty; a labeled `Errors/Warnings:`
/// block appended when stderr is non-empty; a fixed sentinel when both
/// are empty. Total — never fails.
pub fn format_output(stdout: &str, stderr: &str) -> String {
    let mut sections = Vec::new();
    if !stdout.trim().is_empty() {
        sections.push(stdout.trim().to_string());
    }
    if !stderr.trim().is_empty() {
        sections.push(format!("Errors/Warnings:\n{}", stderr.trim()));
    }
    if sections.is_empty() {
        return "No output".to_string();
    }
    sections.join("\n\n")
}
