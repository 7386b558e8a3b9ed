//! Host loop: JSON-line [`HostMessage`]s on stdin, JSON-line [`HostEvent`]s on
//! stdout.
//!
//! Lifecycle messages update the registry inline, in arrival order. Focus and
//! output messages become resolutions spawned on the runtime, so a slow tool
//! never holds up the reader; the registry's per-tab lock keeps each tab's
//! publishes in trigger order.

use std::io;
use std::sync::Arc;
use tabcwd_core::{ChannelDispatch, CwdResolver, ResolutionEvent, ResolverConfig, SessionRegistry};
use tabcwd_protocol::{parse_message, HostEvent, HostMessage};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

pub async fn run(config: &ResolverConfig) -> io::Result<()> {
    let registry = Arc::new(SessionRegistry::new());
    let (dispatch, events) = ChannelDispatch::new();
    let resolver = Arc::new(CwdResolver::for_host(
        config,
        Arc::clone(&registry),
        Arc::new(dispatch),
    ));
    let writer = tokio::spawn(write_events(events, tokio::io::stdout()));
    tracing::info!(platform = ?resolver.platform(), "Serving host messages");

    let mut resolutions = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message = match parse_message(&line) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(code = %err.code, message = %err.message, "Rejected host message");
                continue;
            }
        };
        if let Some(event) = apply(&registry, message) {
            let resolver = Arc::clone(&resolver);
            resolutions.spawn(async move { resolver.handle(event).await });
        }
        while resolutions.try_join_next().is_some() {}
    }

    tracing::debug!(pending = resolutions.len(), "Host closed stdin; draining resolutions");
    while resolutions.join_next().await.is_some() {}
    // Last sender goes with the resolver; the writer then finishes.
    drop(resolver);
    writer
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?
}

/// Applies a host message to the registry and returns the resolution it
/// triggers, if any.
pub fn apply(registry: &SessionRegistry, message: HostMessage) -> Option<ResolutionEvent> {
    match message {
        HostMessage::TabOpen { uid, pid, shell } => {
            tracing::debug!(tab_uid = %uid, pid, shell = ?shell, "Tab opened");
            registry.register(&uid, pid, shell);
            None
        }
        HostMessage::TabClose { uid } => {
            tracing::debug!(tab_uid = %uid, "Tab closed");
            registry.remove(&uid);
            None
        }
        HostMessage::TabFocus { uid, pid, shell } => {
            if let Some(pid) = pid {
                registry.register(&uid, pid, shell.clone());
            }
            registry.focus(&uid);
            let Some(entry) = registry.get(&uid) else {
                tracing::debug!(tab_uid = %uid, "Focus for unknown tab without pid");
                return None;
            };
            let event = ResolutionEvent::focus(uid, entry.pid);
            Some(match shell {
                Some(shell) => event.with_shell(shell),
                None => event,
            })
        }
        HostMessage::SessionData {
            uid,
            pid,
            data,
            shell,
            focused_uid,
        } => {
            let mut event = ResolutionEvent::output(uid, pid, data.into_bytes());
            event.shell = shell;
            event.focused_uid = focused_uid;
            Some(event)
        }
    }
}

/// Writes each event as one JSON line, flushing per line so the host sees it
/// immediately.
pub async fn write_events<W>(mut events: UnboundedReceiver<HostEvent>, mut out: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        let line = match event.to_json_line() {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "Dropping unencodable event");
                continue;
            }
        };
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}
