//! POSIX working-directory lookup.
//!
//! The shell's pid is the process that owns the CWD, so asking the OS for its
//! `cwd` file handle is authoritative. Every successful lookup is published;
//! there is no change detection at this layer.

use crate::config::{PosixBackend, ResolverConfig};
use crate::error::{CwdError, Result};
use crate::tools::ToolRunner;
use crate::types::ResolvedPath;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Column index of `FD` in `lsof` tabular output.
const LSOF_FD_COLUMN: usize = 3;
/// Columns before `NAME`: COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE.
const LSOF_NAME_OFFSET: usize = 8;

#[async_trait]
pub trait OpenFileTable: Send + Sync {
    /// The working directory handle of `pid`.
    async fn cwd_of(&self, pid: u32) -> Result<ResolvedPath>;
}

/// `lsof -a -p <pid> -d cwd`.
pub struct LsofTable {
    program: PathBuf,
    runner: Arc<dyn ToolRunner>,
}

impl LsofTable {
    pub fn new(program: impl Into<PathBuf>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }
}

#[async_trait]
impl OpenFileTable for LsofTable {
    async fn cwd_of(&self, pid: u32) -> Result<ResolvedPath> {
        let args = [
            "-a".to_string(),
            "-p".to_string(),
            pid.to_string(),
            "-d".to_string(),
            "cwd".to_string(),
        ];
        let output = match self.runner.run(&self.program, &args).await {
            Ok(output) => output,
            // lsof exits 1 whenever nothing matched the selection.
            Err(CwdError::CommandFailed { .. }) => return Err(CwdError::ProcessGone { pid }),
            Err(err) => return Err(err),
        };
        parse_lsof_cwd(&output)
            .map(ResolvedPath::new)
            .ok_or(CwdError::ProcessGone { pid })
    }
}

/// Reads the `/proc/<pid>/cwd` link (Linux).
#[derive(Debug, Clone)]
pub struct ProcfsTable {
    root: PathBuf,
}

impl ProcfsTable {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn is_available() -> bool {
        Path::new("/proc/self/cwd").exists()
    }
}

impl Default for ProcfsTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpenFileTable for ProcfsTable {
    async fn cwd_of(&self, pid: u32) -> Result<ResolvedPath> {
        let link = self.root.join(pid.to_string()).join("cwd");
        match tokio::fs::read_link(&link).await {
            Ok(target) => Ok(ResolvedPath::new(
                target.to_string_lossy().trim().to_string(),
            )),
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                ) =>
            {
                Err(CwdError::ProcessGone { pid })
            }
            Err(source) => Err(CwdError::Io {
                context: format!("reading {}", link.display()),
                source,
            }),
        }
    }
}

/// Picks the backend named by the configuration.
pub fn open_file_table(
    config: &ResolverConfig,
    runner: Arc<dyn ToolRunner>,
) -> Arc<dyn OpenFileTable> {
    let use_procfs = match config.posix_backend {
        PosixBackend::Procfs => true,
        PosixBackend::Lsof => false,
        PosixBackend::Auto => ProcfsTable::is_available(),
    };
    if use_procfs {
        Arc::new(ProcfsTable::new())
    } else {
        Arc::new(LsofTable::new(&config.lsof_program, runner))
    }
}

/// Extracts the `cwd` row's NAME from `lsof` tabular output.
///
/// Expected format (header optional, columns separated by runs of spaces):
///
/// ```text
/// COMMAND   PID USER   FD   TYPE DEVICE SIZE/OFF     NODE NAME
/// zsh     12345 pete  cwd    DIR   1,18      640 12345678 /Users/pete/My Code
/// ```
///
/// NAME is everything after the eighth column, so paths with spaces survive.
/// Rows that are too short or carry another FD are skipped.
pub fn parse_lsof_cwd(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (fields, name) = split_leading_fields(line, LSOF_NAME_OFFSET)?;
        if fields[LSOF_FD_COLUMN] != "cwd" {
            return None;
        }
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    })
}

fn split_leading_fields(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line;
    for _ in 0..count {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = &rest[end..];
    }
    Some((fields, rest))
}
