//! # tabcwd-core
//!
//! Resolves the working directory of the shell behind a terminal tab and
//! tells the host when it changes.
//!
//! ## Pipelines
//!
//! - **POSIX**: the shell pid's `cwd` handle from the open-file table
//!   (`lsof`, or `/proc` on Linux). Authoritative; published on every success.
//! - **Windows, native shells** (cmd, PowerShell): the first drive-letter path
//!   in the latest output chunk. Heuristic.
//! - **Windows, wrapper shells** (git-bash, git-cmd): walk from the launcher to
//!   its `bash.exe` child, resolve `/proc/<pid>/cwd` with the MSYS `readlink`,
//!   translate with `cygpath`.
//!
//! ## Design Principles
//!
//! - **Async**: every external query is an await point on tokio; blocking
//!   process-table scans run on the blocking pool.
//! - **Never fatal**: [`CwdResolver::handle`] absorbs failures; an unresolved
//!   directory is "unknown until the next trigger".
//! - **Explicit state**: per-tab caches live in [`SessionRegistry`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabcwd_core::{ChannelDispatch, CwdResolver, ResolutionEvent, ResolverConfig, SessionRegistry};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(SessionRegistry::new());
//! let (dispatch, mut events) = ChannelDispatch::new();
//! let resolver = CwdResolver::for_host(&ResolverConfig::default(), registry.clone(), Arc::new(dispatch));
//!
//! registry.register("tab-1", shell_pid, None);
//! resolver.handle(ResolutionEvent::focus("tab-1", shell_pid)).await;
//! ```

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod patterns;
pub mod posix;
pub mod process_table;
pub mod registry;
pub mod resolver;
pub mod scrape;
pub mod tools;
pub mod types;
pub mod wrapper;

pub use classify::classify_shell;
pub use config::{load_config, PathStyle, PosixBackend, ResolverConfig};
pub use dispatch::{ChannelDispatch, Dispatch};
pub use error::{CwdError, Result};
pub use guard::{PublishDecision, PublishGuard};
pub use posix::{parse_lsof_cwd, LsofTable, OpenFileTable, ProcfsTable};
pub use process_table::{ProcessTable, SysinfoProcessTable};
pub use registry::{SessionEntry, SessionRegistry};
pub use resolver::{Backends, CwdResolver, ResolutionOutcome};
pub use scrape::match_windows_directory;
pub use tools::{CommandToolRunner, ToolRunner};
pub use types::*;
pub use wrapper::WrapperChain;
