//! External tool invocation and output parsing.
//!
//! Every external program the resolvers use (`lsof`, `readlink.exe`,
//! `cygpath.exe`) goes through [`ToolRunner`] so pipelines can be exercised
//! with scripted output in tests. The parsers below are the only place tool
//! stdout is interpreted.

use crate::error::{CwdError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs `program` with `args` and returns its stdout.
    async fn run(&self, program: &Path, args: &[String]) -> Result<String>;
}

/// Runs tools as child processes with a deadline.
#[derive(Debug, Clone)]
pub struct CommandToolRunner {
    timeout: Duration,
}

impl CommandToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for CommandToolRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<String> {
        let command_line = describe_command(program, args);
        tracing::debug!(command = %command_line, "Running tool");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CwdError::ToolUnavailable {
                tool: program.to_path_buf(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CwdError::ToolTimedOut {
                command: command_line.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
            .map_err(|err| CwdError::CommandFailed {
                command: command_line.clone(),
                details: err.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let details = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(CwdError::CommandFailed {
                command: command_line,
                details,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub fn describe_command(program: &Path, args: &[String]) -> String {
    let mut line = format!("\"{}\"", program.display());
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Parses a link-resolution result: exactly one absolute POSIX path,
/// optionally followed by a newline (`/c/Users/pete\n`).
pub fn parse_posix_path(tool: &str, output: &str) -> Result<String> {
    let path = single_line(tool, output)?;
    if !path.starts_with('/') {
        return Err(malformed(tool, output));
    }
    Ok(path.to_string())
}

/// Parses a path-translation result: exactly one drive-letter or UNC path
/// (`C:\Users\pete\n`, `C:/Users/pete`, `\\server\share`).
pub fn parse_windows_path(tool: &str, output: &str) -> Result<String> {
    let path = single_line(tool, output)?;
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/');
    let unc = path.starts_with("\\\\");
    if !(drive || unc) {
        return Err(malformed(tool, output));
    }
    Ok(path.to_string())
}

fn single_line<'a>(tool: &str, output: &'a str) -> Result<&'a str> {
    let mut lines = output
        .lines()
        .map(|line| line.trim_matches(|c: char| c == '\r' || c == '\n'))
        .filter(|line| !line.trim().is_empty());
    let Some(first) = lines.next() else {
        return Err(malformed(tool, output));
    };
    if lines.next().is_some() {
        return Err(malformed(tool, output));
    }
    Ok(first.trim_end())
}

fn malformed(tool: &str, output: &str) -> CwdError {
    CwdError::MalformedOutput {
        tool: tool.to_string(),
        output: output.to_string(),
    }
}
