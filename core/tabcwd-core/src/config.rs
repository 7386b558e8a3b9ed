//! Resolver configuration.
//!
//! Read from `$TABCWD_CONFIG` or `~/.tabcwd/config.toml`. A missing file means
//! defaults; a malformed one is reported so the caller can decide to fall back.

use crate::error::{CwdError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_ENV_VAR: &str = "TABCWD_CONFIG";
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 5_000;

/// Launchers known to run the real interactive shell as a child.
pub const DEFAULT_WRAPPER_NAMES: [&str; 4] = ["sh.exe", "bash.exe", "git-bash.exe", "git-cmd.exe"];

/// Output syntax requested from the path-translation tool.
///
/// `windows` publishes long names. Terminal integrations that call
/// `cygpath --dos` publish 8.3 short names instead; set `dos` to emit exactly
/// what they do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// `C:\Program Files\Git`
    #[default]
    Windows,
    /// 8.3 short names, `C:\PROGRA~1\Git`. Same output as `cygpath --dos`.
    Dos,
    /// Forward slashes, `C:/Program Files/Git`
    Mixed,
}

impl PathStyle {
    pub fn flag(self) -> &'static str {
        match self {
            PathStyle::Windows => "--windows",
            PathStyle::Dos => "--dos",
            PathStyle::Mixed => "--mixed",
        }
    }
}

/// Where the POSIX resolver reads the open-file table from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosixBackend {
    Lsof,
    /// `/proc/<pid>/cwd`, Linux only.
    Procfs,
    /// procfs when `/proc` is mounted, lsof otherwise.
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Only publish for the tab the host currently has focused. Caches of
    /// background tabs are still refreshed.
    pub publish_only_if_focused: bool,
    /// Run the wrapper chain's second hop and publish a Windows path. When
    /// off, the POSIX path from the link-resolution hop is published as-is.
    pub translate_wrapper_paths: bool,
    pub path_style: PathStyle,
    pub wrapper_names: Vec<String>,
    pub interactive_shell_name: String,
    pub readlink_tool: String,
    pub path_tool: String,
    pub posix_backend: PosixBackend,
    pub lsof_program: String,
    pub tool_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            publish_only_if_focused: false,
            translate_wrapper_paths: true,
            path_style: PathStyle::default(),
            wrapper_names: DEFAULT_WRAPPER_NAMES.iter().map(|s| s.to_string()).collect(),
            interactive_shell_name: "bash.exe".to_string(),
            readlink_tool: "readlink.exe".to_string(),
            path_tool: "cygpath.exe".to_string(),
            posix_backend: PosixBackend::default(),
            lsof_program: "lsof".to_string(),
            tool_timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
        }
    }
}

/// Returns the config path, honouring `$TABCWD_CONFIG`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".tabcwd").join("config.toml"))
}

/// Loads the resolver configuration, returning defaults if the file doesn't exist.
pub fn load_config(path: Option<PathBuf>) -> Result<ResolverConfig> {
    let Some(config_path) = path.or_else(default_config_path) else {
        return Ok(ResolverConfig::default());
    };

    if !config_path.exists() {
        return Ok(ResolverConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| CwdError::Io {
        context: format!("reading config {}", config_path.display()),
        source,
    })?;
    toml::from_str::<ResolverConfig>(&content).map_err(|err| CwdError::ConfigMalformed {
        path: config_path,
        details: err.to_string(),
    })
}
