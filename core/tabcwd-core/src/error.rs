//! Error types for tabcwd-core operations.
//!
//! A failed lookup is never fatal: callers treat it as "unknown, try again on
//! the next trigger". A prompt scrape that finds nothing is not an error at all.

use std::path::PathBuf;

/// All errors that can occur while resolving a shell's working directory.
#[derive(Debug, thiserror::Error)]
pub enum CwdError {
    // ─────────────────────────────────────────────────────────────────────
    // Process Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Process {pid} is gone or reports no working directory")]
    ProcessGone { pid: u32 },

    #[error("Could not find any child shell process for PID {wrapper_pid}")]
    NoShellChild { wrapper_pid: u32 },

    #[error("Process {pid} has no readable executable path")]
    MissingExecutablePath { pid: u32 },

    #[error("Process table unavailable: {0}")]
    ProcessTableUnavailable(String),

    // ─────────────────────────────────────────────────────────────────────
    // Tool Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Tool unavailable: {tool}: {source}")]
    ToolUnavailable {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution failed: {command}: {details}")]
    CommandFailed { command: String, details: String },

    #[error("Command timed out after {timeout_ms}ms: {command}")]
    ToolTimedOut { command: String, timeout_ms: u64 },

    #[error("Unexpected output from {tool}: {output:?}")]
    MalformedOutput { tool: String, output: String },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl CwdError {
    /// Whether the next trigger for the same tab may succeed.
    ///
    /// Configuration problems are not going to fix themselves between two
    /// keystrokes; everything else is tied to process or tool state.
    pub fn is_transient(&self) -> bool {
        !matches!(self, CwdError::ConfigMalformed { .. })
    }
}

/// Convenience type alias for Results using CwdError.
pub type Result<T> = std::result::Result<T, CwdError>;

impl From<CwdError> for String {
    fn from(err: CwdError) -> String {
        err.to_string()
    }
}
