//! Running external media tools.

use crate::error::ProcessingError;
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Validate that a tool path doesn't contain shell metacharacters or traversal.
pub(crate) fn validate_tool_path(path: &str) -> Result<(), ProcessingError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ProcessingError::InvalidToolPath(format!(
            "Path contains dangerous characters: {}",
            path
        )));
    }

    if path.contains("..") {
        return Err(ProcessingError::InvalidToolPath(format!(
            "Path contains directory traversal: {}",
            path
        )));
    }

    if !path.chars().all(|c| {
        c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\' || c == ':'
    }) {
        return Err(ProcessingError::InvalidToolPath(format!(
            "Path contains unsafe characters: {}",
            path
        )));
    }

    Ok(())
}

/// Run `program` to completion, capturing stdout and stderr.
///
/// The child is killed if the returned future is dropped.
pub(crate) async fn run<I, S>(program: &str, args: I) -> std::io::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
}

/// Last few lines of a tool's stderr, for logs and error messages.
pub(crate) fn stderr_tail(stderr: &[u8]) -> String {
    const MAX_LINES: usize = 5;
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(MAX_LINES);
    lines[start..].join(" | ")
}
