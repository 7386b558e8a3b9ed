//! Logging setup for the hook binary.
//!
//! stdout carries protocol lines in `serve` mode, so logs never go there.
//! `RUST_LOG` controls the filter; `TABCWD_DEBUG_LOG=1` forces debug.

use std::env;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEBUG_ENV_VAR: &str = "TABCWD_DEBUG_LOG";

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV_VAR)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn filter() -> EnvFilter {
    if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

pub fn log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tabcwd").join("logs"))
}

/// Installs the global subscriber: a daily file under [`log_dir`], or stderr
/// when the directory can't be created. Keep the guard alive for the life of
/// the process or buffered file output is lost.
pub fn init() -> Option<WorkerGuard> {
    let dir = log_dir().filter(|dir| fs_err::create_dir_all(dir).is_ok());
    let Some(dir) = dir else {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(dir, "tabcwd-hook.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Some(guard)
}
