//! Core types shared by the resolver pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A working directory in platform-native path syntax. No normalisation
/// beyond trimming happens anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedPath(String);

impl ResolvedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which resolution pipeline applies to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// Windows shell classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellKind {
    /// Launcher that runs the real interactive shell as a child process.
    Wrapper,
    Native,
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellKind::Wrapper => f.write_str("wrapper"),
            ShellKind::Native => f.write_str("native"),
        }
    }
}

/// One row of the OS process table. Fetched per resolution, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub name: String,
    pub executable_path: Option<PathBuf>,
    pub pid: u32,
    pub parent_pid: Option<u32>,
}

/// What caused a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A chunk of terminal output.
    Output { data: Vec<u8> },
    /// The tab was focused.
    Focus,
}

/// Inbound trigger for one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEvent {
    pub tab_uid: String,
    pub pid: u32,
    pub trigger: Trigger,
    /// Shell executable reported with the action; falls back to the
    /// registered shell of the tab.
    pub shell: Option<String>,
    /// Focused tab at trigger time; falls back to the registry's focus.
    pub focused_uid: Option<String>,
}

impl ResolutionEvent {
    pub fn output(tab_uid: impl Into<String>, pid: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            tab_uid: tab_uid.into(),
            pid,
            trigger: Trigger::Output { data: data.into() },
            shell: None,
            focused_uid: None,
        }
    }

    pub fn focus(tab_uid: impl Into<String>, pid: u32) -> Self {
        Self {
            tab_uid: tab_uid.into(),
            pid,
            trigger: Trigger::Focus,
            shell: None,
            focused_uid: None,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn with_focused_uid(mut self, uid: impl Into<String>) -> Self {
        self.focused_uid = Some(uid.into());
        self
    }

    pub fn is_focus(&self) -> bool {
        matches!(self.trigger, Trigger::Focus)
    }

    pub fn output_data(&self) -> Option<&[u8]> {
        match &self.trigger {
            Trigger::Output { data } => Some(data),
            Trigger::Focus => None,
        }
    }
}
