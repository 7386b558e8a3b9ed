//! tabcwd-hook: host shim for terminal tab working-directory tracking.
//!
//! ## Subcommands
//!
//! - `serve`: host loop, JSON-line messages on stdin, events on stdout
//! - `resolve`: one-shot lookup for a shell pid
//! - `classify`: report how a Windows shell executable is resolved
//! - `scrape`: run the prompt matcher over stdin

mod logging;
mod serve;

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tabcwd_core::{
    classify_shell, load_config, match_windows_directory, Backends, ChannelDispatch, CwdResolver,
    Platform, ResolutionEvent, ResolverConfig, SessionRegistry,
};

#[derive(Parser)]
#[command(name = "tabcwd-hook")]
#[command(about = "Terminal tab working-directory resolver")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $TABCWD_CONFIG or ~/.tabcwd/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve host messages (JSON lines on stdin, events on stdout)
    Serve,

    /// Resolve the working directory of one shell process
    Resolve {
        /// Shell process ID (the wrapper's pid for git-bash style launchers)
        #[arg(long)]
        pid: u32,

        /// Shell executable, used to classify Windows shells
        #[arg(long)]
        shell: Option<String>,

        /// Pipeline to run (defaults to the host platform)
        #[arg(long, value_enum)]
        platform: Option<PlatformArg>,
    },

    /// Print whether a shell executable is a wrapper or native shell
    Classify {
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Print the first Windows path found in stdin
    Scrape,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Posix,
    Windows,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Posix => Platform::Posix,
            PlatformArg::Windows => Platform::Windows,
        }
    }
}

#[tokio::main]
async fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();
    let config = config_or_default(cli.config);

    match cli.command {
        Commands::Serve => {
            if let Err(e) = serve::run(&config).await {
                tracing::error!(error = %e, "tabcwd-hook serve failed");
                std::process::exit(1);
            }
        }
        Commands::Resolve {
            pid,
            shell,
            platform,
        } => {
            let platform = platform.map(Platform::from).unwrap_or_else(Platform::current);
            if !resolve_once(&config, platform, pid, shell).await {
                std::process::exit(1);
            }
        }
        Commands::Classify { shell } => {
            println!("{}", classify_shell(Some(shell.as_str()), &config.wrapper_names));
        }
        Commands::Scrape => {
            let mut data = Vec::new();
            if let Err(e) = std::io::stdin().read_to_end(&mut data) {
                tracing::error!(error = %e, "Failed to read stdin");
                std::process::exit(1);
            }
            match match_windows_directory(&data) {
                Some(path) => println!("{}", path),
                None => std::process::exit(1),
            }
        }
    }
}

/// A malformed config is not fatal; the resolver runs on defaults.
fn config_or_default(path: Option<PathBuf>) -> ResolverConfig {
    load_config(path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable config; using defaults");
        ResolverConfig::default()
    })
}

/// Runs one lookup and prints the path. Returns false when nothing was
/// resolved.
async fn resolve_once(
    config: &ResolverConfig,
    platform: Platform,
    pid: u32,
    shell: Option<String>,
) -> bool {
    let (dispatch, _events) = ChannelDispatch::new();
    let resolver = CwdResolver::new(
        platform,
        config,
        Backends::system(config),
        Arc::new(SessionRegistry::new()),
        Arc::new(dispatch),
    );

    let mut event = ResolutionEvent::focus("cli", pid);
    event.shell = shell;
    match resolver.resolve(&event).await {
        Ok(Some(path)) => {
            println!("{}", path);
            true
        }
        Ok(None) => {
            eprintln!("no working directory found for pid {}", pid);
            false
        }
        Err(e) => {
            tracing::warn!(pid, error = %e, "tabcwd-hook resolve failed");
            eprintln!("{}", e);
            false
        }
    }
}
