//! Windows shell classification.
//!
//! Git for Windows ships launchers (`git-bash.exe`, `git-cmd.exe`, and the
//! `sh.exe`/`bash.exe` front-ends in its root) that run the MSYS `bash.exe`
//! as a child. The pid the host knows belongs to the launcher, so those
//! shells need the wrapper chain instead of prompt scraping.

use crate::types::ShellKind;

/// Classifies the shell executable reported by the host.
///
/// Accepts a bare name, a full path with either separator, optionally quoted
/// and followed by arguments. Matching is case-insensitive on the file-name
/// component. Absent or unrecognised shells are [`ShellKind::Native`].
pub fn classify_shell<S: AsRef<str>>(shell: Option<&str>, wrapper_names: &[S]) -> ShellKind {
    let Some(shell) = shell.map(str::trim).filter(|value| !value.is_empty()) else {
        return ShellKind::Native;
    };

    let lowered = shell.to_lowercase();
    let is_wrapper = lowered
        .split(&['\\', '/'][..])
        .map(|segment| segment.trim_start_matches(&['"', '\''][..]))
        .any(|segment| {
            wrapper_names
                .iter()
                .any(|name| names_executable(segment, &name.as_ref().to_lowercase()))
        });

    if is_wrapper {
        ShellKind::Wrapper
    } else {
        ShellKind::Native
    }
}

fn names_executable(segment: &str, name: &str) -> bool {
    match segment.strip_prefix(name) {
        Some(rest) => rest.is_empty() || rest.starts_with(&[' ', '\t', '"', '\''][..]),
        None => false,
    }
}
