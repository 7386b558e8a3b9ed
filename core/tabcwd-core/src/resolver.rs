//! Resolution orchestration.
//!
//! ```text
//! ResolutionEvent
//!   ├─ POSIX ───────▶ open-file table (lsof / procfs) ─────────▶ cache ─▶ publish
//!   └─ Windows ─classify─┬─ native ──▶ prompt scrape ──────────▶ cache ─▶ guard ─▶ publish
//!                        └─ wrapper ─▶ children ▶ select ▶ readlink ▶ cygpath ─┘
//! ```
//!
//! [`CwdResolver::handle`] is the boundary: it never returns an error and
//! never panics on tool or process failures. A failed lookup is logged and
//! reported as [`ResolutionOutcome::Failed`]; the next trigger tries again.

use crate::classify::classify_shell;
use crate::config::ResolverConfig;
use crate::dispatch::Dispatch;
use crate::error::{CwdError, Result};
use crate::guard::{PublishDecision, PublishGuard};
use crate::posix::{open_file_table, OpenFileTable};
use crate::process_table::{ProcessTable, SysinfoProcessTable};
use crate::registry::SessionRegistry;
use crate::scrape::match_windows_directory;
use crate::tools::{CommandToolRunner, ToolRunner};
use crate::types::{Platform, ResolutionEvent, ResolvedPath, ShellKind};
use crate::wrapper::WrapperChain;
use std::sync::Arc;
use std::time::Duration;
use tabcwd_protocol::HostEvent;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum ResolutionOutcome {
    /// Cached and published.
    Published(ResolvedPath),
    /// Cached; equal to the previous value.
    Unchanged(ResolvedPath),
    /// Cached; not published because the tab is not focused.
    Suppressed(ResolvedPath),
    /// Output chunk held no path. Not an error.
    NoMatch,
    /// The tab is not registered, or was closed or given a new shell while
    /// resolving.
    UnknownTab,
    Failed(CwdError),
}

impl ResolutionOutcome {
    pub fn published(&self) -> Option<&ResolvedPath> {
        match self {
            ResolutionOutcome::Published(path) => Some(path),
            _ => None,
        }
    }
}

/// External collaborators the pipelines talk to.
pub struct Backends {
    pub open_files: Arc<dyn OpenFileTable>,
    pub processes: Arc<dyn ProcessTable>,
    pub runner: Arc<dyn ToolRunner>,
}

impl Backends {
    /// Real OS backends for the configured tools.
    pub fn system(config: &ResolverConfig) -> Self {
        let runner: Arc<dyn ToolRunner> = Arc::new(CommandToolRunner::new(Duration::from_millis(
            config.tool_timeout_ms,
        )));
        Self {
            open_files: open_file_table(config, Arc::clone(&runner)),
            processes: Arc::new(SysinfoProcessTable),
            runner,
        }
    }
}

pub struct CwdResolver {
    platform: Platform,
    wrapper_names: Vec<String>,
    guard: PublishGuard,
    open_files: Arc<dyn OpenFileTable>,
    wrapper: WrapperChain,
    registry: Arc<SessionRegistry>,
    dispatch: Arc<dyn Dispatch>,
}

impl CwdResolver {
    pub fn new(
        platform: Platform,
        config: &ResolverConfig,
        backends: Backends,
        registry: Arc<SessionRegistry>,
        dispatch: Arc<dyn Dispatch>,
    ) -> Self {
        Self {
            platform,
            wrapper_names: config.wrapper_names.clone(),
            guard: PublishGuard::new(config.publish_only_if_focused),
            open_files: backends.open_files,
            wrapper: WrapperChain::new(config, backends.processes, backends.runner),
            registry,
            dispatch,
        }
    }

    /// Resolver for the host this binary runs on.
    pub fn for_host(
        config: &ResolverConfig,
        registry: Arc<SessionRegistry>,
        dispatch: Arc<dyn Dispatch>,
    ) -> Self {
        Self::new(
            Platform::current(),
            config,
            Backends::system(config),
            registry,
            dispatch,
        )
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Runs [`handle`](Self::handle) on the runtime without waiting for it.
    pub fn spawn(self: &Arc<Self>, event: ResolutionEvent) -> JoinHandle<ResolutionOutcome> {
        let resolver = Arc::clone(self);
        tokio::spawn(async move { resolver.handle(event).await })
    }

    /// Resolves, caches and (maybe) publishes the CWD for one trigger.
    pub async fn handle(&self, event: ResolutionEvent) -> ResolutionOutcome {
        let Some(lock) = self.registry.resolution_lock(&event.tab_uid) else {
            debug!(tab_uid = %event.tab_uid, "Ignoring trigger for unknown tab");
            return ResolutionOutcome::UnknownTab;
        };
        let _serialized = lock.lock().await;

        match self.resolve(&event).await {
            Ok(Some(path)) => self.commit(&event, path),
            Ok(None) if event.is_focus() => self.republish_cached(&event),
            Ok(None) => ResolutionOutcome::NoMatch,
            Err(err) => {
                warn!(
                    tab_uid = %event.tab_uid,
                    pid = event.pid,
                    error = %err,
                    transient = err.is_transient(),
                    "Working directory resolution failed"
                );
                ResolutionOutcome::Failed(err)
            }
        }
    }

    /// Runs the platform pipeline without touching the cache or the host.
    /// `Ok(None)` means a native prompt scrape found nothing.
    pub async fn resolve(&self, event: &ResolutionEvent) -> Result<Option<ResolvedPath>> {
        match self.platform {
            Platform::Posix => self.open_files.cwd_of(event.pid).await.map(Some),
            Platform::Windows => match self.shell_kind(event) {
                ShellKind::Wrapper => self.wrapper.resolve(event.pid).await.map(Some),
                ShellKind::Native => Ok(event.output_data().and_then(match_windows_directory)),
            },
        }
    }

    pub fn shell_kind(&self, event: &ResolutionEvent) -> ShellKind {
        let shell = event.shell.clone().or_else(|| {
            self.registry
                .get(&event.tab_uid)
                .and_then(|entry| entry.shell)
        });
        classify_shell(shell.as_deref(), &self.wrapper_names)
    }

    fn commit(&self, event: &ResolutionEvent, path: ResolvedPath) -> ResolutionOutcome {
        let recorded = self
            .registry
            .record_cwd_for(&event.tab_uid, event.pid, path.as_str());
        let Some(previous) = recorded else {
            debug!(
                tab_uid = %event.tab_uid,
                pid = event.pid,
                cwd = %path,
                "Tab closed or replaced before resolution finished"
            );
            return ResolutionOutcome::UnknownTab;
        };

        if self.platform == Platform::Posix {
            self.publish(event, &path);
            return ResolutionOutcome::Published(path);
        }

        let focused = self.focused_uid(event);
        let decision = if event.is_focus() {
            self.guard.decide_refocus(&event.tab_uid, focused.as_deref())
        } else {
            self.guard.decide(
                previous.as_deref(),
                &path,
                &event.tab_uid,
                focused.as_deref(),
            )
        };
        self.apply(event, decision, path, focused)
    }

    /// A focus trigger the pipeline can't answer (native shells have no
    /// prompt to scrape yet) falls back to the directory cached while the
    /// tab was in the background.
    fn republish_cached(&self, event: &ResolutionEvent) -> ResolutionOutcome {
        let Some(entry) = self
            .registry
            .get(&event.tab_uid)
            .filter(|entry| entry.pid == event.pid)
        else {
            return ResolutionOutcome::UnknownTab;
        };
        let Some(cwd) = entry.cwd else {
            return ResolutionOutcome::NoMatch;
        };
        let focused = self.focused_uid(event);
        let decision = self
            .guard
            .decide_refocus(&event.tab_uid, focused.as_deref());
        self.apply(event, decision, ResolvedPath::new(cwd), focused)
    }

    fn focused_uid(&self, event: &ResolutionEvent) -> Option<String> {
        event
            .focused_uid
            .clone()
            .or_else(|| self.registry.focused())
    }

    fn apply(
        &self,
        event: &ResolutionEvent,
        decision: PublishDecision,
        path: ResolvedPath,
        focused: Option<String>,
    ) -> ResolutionOutcome {
        match decision {
            PublishDecision::Publish => {
                self.publish(event, &path);
                ResolutionOutcome::Published(path)
            }
            PublishDecision::Unchanged => ResolutionOutcome::Unchanged(path),
            PublishDecision::Unfocused => {
                debug!(
                    tab_uid = %event.tab_uid,
                    focused_uid = ?focused,
                    cwd = %path,
                    "Cached cwd for background tab"
                );
                ResolutionOutcome::Suppressed(path)
            }
        }
    }

    fn publish(&self, event: &ResolutionEvent, path: &ResolvedPath) {
        info!(tab_uid = %event.tab_uid, pid = event.pid, cwd = %path, "Publishing cwd");
        self.dispatch.dispatch(HostEvent::set_cwd(path.as_str()));
    }
}
