//! Prompt scraping for native Windows shells.
//!
//! cmd.exe and PowerShell print the working directory in their prompt, so the
//! first drive-letter path in an output chunk is taken as the new CWD. This is
//! a heuristic: customised prompts can make it miss or match something else,
//! and the match is never checked against the filesystem.

use crate::patterns::RE_WINDOWS_DIRECTORY;
use crate::types::ResolvedPath;

/// Returns the first Windows absolute path in `data`, or `None`. A bare
/// drive letter is skipped in favour of a later match.
///
/// Trailing whitespace is dropped from the match since prompts usually end
/// with a space before the cursor.
pub fn match_windows_directory(data: &[u8]) -> Option<ResolvedPath> {
    let text = String::from_utf8_lossy(data);
    RE_WINDOWS_DIRECTORY
        .find_iter(&text)
        .map(|found| found.as_str().trim_end())
        // "C:" followed only by whitespace
        .find(|path| path.len() > 2)
        .map(ResolvedPath::new)
}
