//! Publish guard.
//!
//! Decides whether a freshly resolved directory is worth an event. The cache
//! write is not the guard's business: the registry always takes the
//! candidate, so a background tab's cache stays warm for when it is focused.

use crate::types::ResolvedPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    Publish,
    /// Same as the cached value.
    Unchanged,
    /// Changed, but another tab has focus.
    Unfocused,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishGuard {
    pub publish_only_if_focused: bool,
}

impl PublishGuard {
    pub fn new(publish_only_if_focused: bool) -> Self {
        Self {
            publish_only_if_focused,
        }
    }

    pub fn decide(
        &self,
        cached: Option<&str>,
        candidate: &ResolvedPath,
        tab_uid: &str,
        focused_uid: Option<&str>,
    ) -> PublishDecision {
        if cached == Some(candidate.as_str()) {
            return PublishDecision::Unchanged;
        }
        self.decide_refocus(tab_uid, focused_uid)
    }

    /// Decision for a tab that just gained focus. The host's indicator still
    /// shows the previous tab, so an unchanged value is published too.
    pub fn decide_refocus(&self, tab_uid: &str, focused_uid: Option<&str>) -> PublishDecision {
        if self.publish_only_if_focused && focused_uid != Some(tab_uid) {
            return PublishDecision::Unfocused;
        }
        PublishDecision::Publish
    }
}
