//! Working-directory resolution through Windows shell wrappers.
//!
//! The host only knows the pid of the launcher (`git-bash.exe`, `git-cmd.exe`).
//! The directory lives with the MSYS `bash.exe` it spawned, and Windows does
//! not expose another process's CWD directly, so the chain is:
//!
//! ```text
//! wrapper pid ─enumerate─▶ children ─select─▶ bash.exe pid
//!     ─readlink.exe -e /proc/<pid>/cwd─▶ /c/Users/pete
//!     ─cygpath.exe --windows─▶ C:\Users\pete
//! ```
//!
//! Both tools ship next to `bash.exe`. Each stage returns a `Result` and the
//! chain stops at the first failure, so nothing partial is ever published.

use crate::config::{PathStyle, ResolverConfig};
use crate::error::{CwdError, Result};
use crate::process_table::ProcessTable;
use crate::tools::{parse_posix_path, parse_windows_path, ToolRunner};
use crate::types::{ProcessRecord, ResolvedPath};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub struct WrapperChain {
    processes: Arc<dyn ProcessTable>,
    runner: Arc<dyn ToolRunner>,
    shell_name: String,
    readlink_tool: String,
    path_tool: String,
    translate: bool,
    path_style: PathStyle,
}

impl WrapperChain {
    pub fn new(
        config: &ResolverConfig,
        processes: Arc<dyn ProcessTable>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            processes,
            runner,
            shell_name: config.interactive_shell_name.clone(),
            readlink_tool: config.readlink_tool.clone(),
            path_tool: config.path_tool.clone(),
            translate: config.translate_wrapper_paths,
            path_style: config.path_style,
        }
    }

    /// Runs the whole chain for one wrapper process.
    pub async fn resolve(&self, wrapper_pid: u32) -> Result<ResolvedPath> {
        let children = self.enumerate(wrapper_pid).await?;
        let shell = select_shell(&children, &self.shell_name)
            .ok_or(CwdError::NoShellChild { wrapper_pid })?;
        debug!(
            wrapper_pid,
            shell_pid = shell.pid,
            shell_exe = ?shell.executable_path,
            "Selected interactive shell under wrapper"
        );

        let tool_dir = tool_dir(shell)?;
        let posix_cwd = self.read_cwd_link(&tool_dir, shell.pid).await?;
        if !self.translate {
            return Ok(ResolvedPath::new(posix_cwd));
        }
        let windows_cwd = self.translate_path(&tool_dir, &posix_cwd).await?;
        Ok(ResolvedPath::new(windows_cwd))
    }

    /// Stage 1: children of the wrapper, read off the async runtime.
    pub async fn enumerate(&self, wrapper_pid: u32) -> Result<Vec<ProcessRecord>> {
        let processes = Arc::clone(&self.processes);
        let children = tokio::task::spawn_blocking(move || processes.children_of(wrapper_pid))
            .await
            .map_err(|err| CwdError::ProcessTableUnavailable(err.to_string()))??;
        debug!(wrapper_pid, count = children.len(), "Enumerated wrapper children");
        Ok(children)
    }

    /// Stage 3: resolve the shell's `/proc/<pid>/cwd` link to a POSIX path.
    pub async fn read_cwd_link(&self, tool_dir: &Path, shell_pid: u32) -> Result<String> {
        let readlink = tool_dir.join(&self.readlink_tool);
        let args = ["-e".to_string(), format!("/proc/{}/cwd", shell_pid)];
        let output = self.runner.run(&readlink, &args).await?;
        let posix_cwd = parse_posix_path(&self.readlink_tool, &output)?;
        debug!(shell_pid, posix_cwd = %posix_cwd, "Resolved cwd link");
        Ok(posix_cwd)
    }

    /// Stage 4: translate the POSIX path into Windows syntax.
    pub async fn translate_path(&self, tool_dir: &Path, posix_cwd: &str) -> Result<String> {
        let cygpath = tool_dir.join(&self.path_tool);
        let args = [self.path_style.flag().to_string(), posix_cwd.to_string()];
        let output = self.runner.run(&cygpath, &args).await?;
        let windows_cwd = parse_windows_path(&self.path_tool, &output)?;
        debug!(posix_cwd = %posix_cwd, windows_cwd = %windows_cwd, "Translated cwd");
        Ok(windows_cwd)
    }
}

/// Stage 2: the first child running the interactive shell binary.
pub fn select_shell<'a>(
    children: &'a [ProcessRecord],
    shell_name: &str,
) -> Option<&'a ProcessRecord> {
    children
        .iter()
        .find(|child| child.name.eq_ignore_ascii_case(shell_name))
}

/// Directory holding the shell binary, where its companion tools live.
pub fn tool_dir(shell: &ProcessRecord) -> Result<PathBuf> {
    shell
        .executable_path
        .as_deref()
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or(CwdError::MissingExecutablePath { pid: shell.pid })
}
