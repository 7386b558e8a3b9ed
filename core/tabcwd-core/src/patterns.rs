//! Compiled regex patterns for scraping shell output.
//!
//! Compiled once on first use. Update these when prompt formats change.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Windows Prompt Regexes
// ═══════════════════════════════════════════════════════════════════════════════

/// Drive letter, colon, then anything that can appear in a Windows path.
///
/// Control characters are excluded so a match stops at line ends and at the
/// escape sequences prompt themes (posh-git, posh-hg) append after the path.
pub static RE_WINDOWS_DIRECTORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[a-zA-Z]:[^:\[\]?"<>|\x00-\x1f]+"#).unwrap());
