//! Per-tab session state.
//!
//! The registry is the single owner of each tab's cached working directory.
//! Resolvers never write into host records; they go through
//! [`SessionRegistry::record_cwd`].
//!
//! Resolutions of one tab are serialized by a per-tab async lock, so when a
//! tab is triggered twice in quick succession the later trigger also completes
//! last. Different tabs do not contend.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEntry {
    pub uid: String,
    pub pid: u32,
    pub shell: Option<String>,
    pub cwd: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

struct TabSlot {
    entry: SessionEntry,
    resolution_lock: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Default)]
struct RegistryState {
    tabs: HashMap<String, TabSlot>,
    focused: Option<String>,
}

#[derive(Default)]
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tab, or refreshes its pid and shell. A new pid means a new
    /// shell, so the cached directory is dropped.
    pub fn register(&self, uid: &str, pid: u32, shell: Option<String>) {
        let mut state = self.state();
        match state.tabs.get_mut(uid) {
            Some(slot) => {
                if slot.entry.pid != pid {
                    slot.entry.pid = pid;
                    slot.entry.cwd = None;
                    slot.entry.updated_at = None;
                }
                if shell.is_some() {
                    slot.entry.shell = shell;
                }
            }
            None => {
                state.tabs.insert(
                    uid.to_string(),
                    TabSlot {
                        entry: SessionEntry {
                            uid: uid.to_string(),
                            pid,
                            shell,
                            cwd: None,
                            updated_at: None,
                        },
                        resolution_lock: Arc::new(tokio::sync::Mutex::new(())),
                    },
                );
            }
        }
    }

    pub fn remove(&self, uid: &str) -> Option<SessionEntry> {
        let mut state = self.state();
        if state.focused.as_deref() == Some(uid) {
            state.focused = None;
        }
        state.tabs.remove(uid).map(|slot| slot.entry)
    }

    pub fn focus(&self, uid: &str) {
        self.state().focused = Some(uid.to_string());
    }

    pub fn focused(&self) -> Option<String> {
        self.state().focused.clone()
    }

    pub fn get(&self, uid: &str) -> Option<SessionEntry> {
        self.state().tabs.get(uid).map(|slot| slot.entry.clone())
    }

    pub fn entries(&self) -> Vec<SessionEntry> {
        let mut entries = self
            .state()
            .tabs
            .values()
            .map(|slot| slot.entry.clone())
            .collect::<Vec<_>>();
        entries.sort_by(|left, right| left.uid.cmp(&right.uid));
        entries
    }

    pub fn len(&self) -> usize {
        self.state().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a resolved directory unconditionally and returns the previous
    /// one. `None` when the tab is not (or no longer) registered.
    pub fn record_cwd(&self, uid: &str, cwd: &str) -> Option<Option<String>> {
        self.write_cwd(uid, None, cwd)
    }

    /// Like [`record_cwd`](Self::record_cwd), but only while the tab still runs
    /// `pid`. A tab closed and reopened under the same uid gets a new shell,
    /// and a lookup started for the old one must not land in its cache.
    pub fn record_cwd_for(&self, uid: &str, pid: u32, cwd: &str) -> Option<Option<String>> {
        self.write_cwd(uid, Some(pid), cwd)
    }

    /// Lock serializing resolutions of one tab.
    pub fn resolution_lock(&self, uid: &str) -> Option<Arc<tokio::sync::Mutex<()>>> {
        self.state()
            .tabs
            .get(uid)
            .map(|slot| Arc::clone(&slot.resolution_lock))
    }

    fn write_cwd(&self, uid: &str, pid: Option<u32>, cwd: &str) -> Option<Option<String>> {
        let mut state = self.state();
        let slot = state.tabs.get_mut(uid)?;
        if pid.is_some_and(|pid| pid != slot.entry.pid) {
            return None;
        }
        let previous = slot.entry.cwd.replace(cwd.to_string());
        slot.entry.updated_at = Some(Utc::now());
        Some(previous)
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        // Plain data behind the lock; a panicked writer leaves it consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_cwd_returns_previous_and_overwrites() {
        let registry = SessionRegistry::new();
        registry.register("tab-1", 10, None);

        assert_eq!(registry.record_cwd("tab-1", "/a"), Some(None));
        assert_eq!(
            registry.record_cwd("tab-1", "/a"),
            Some(Some("/a".to_string()))
        );
        assert_eq!(
            registry.record_cwd("tab-1", "/b"),
            Some(Some("/a".to_string()))
        );

        let entry = registry.get("tab-1").expect("entry");
        assert_eq!(entry.cwd.as_deref(), Some("/b"));
        assert!(entry.updated_at.is_some());
    }

    #[test]
    fn record_cwd_for_unknown_tab_is_dropped() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.record_cwd("ghost", "/a"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn record_cwd_for_ignores_a_replaced_shell() {
        let registry = SessionRegistry::new();
        registry.register("tab-1", 10, None);
        assert_eq!(registry.record_cwd_for("tab-1", 10, "/a"), Some(None));

        registry.remove("tab-1");
        registry.register("tab-1", 11, None);
        assert_eq!(registry.record_cwd_for("tab-1", 10, "/stale"), None);
        assert_eq!(registry.get("tab-1").and_then(|entry| entry.cwd), None);

        assert_eq!(registry.record_cwd_for("tab-1", 11, "/b"), Some(None));
    }

    #[test]
    fn reregister_with_new_pid_resets_cache() {
        let registry = SessionRegistry::new();
        registry.register("tab-1", 10, Some("bash".to_string()));
        registry.record_cwd("tab-1", "/a");

        registry.register("tab-1", 10, None);
        let entry = registry.get("tab-1").expect("entry");
        assert_eq!(entry.cwd.as_deref(), Some("/a"));
        assert_eq!(entry.shell.as_deref(), Some("bash"));

        registry.register("tab-1", 11, None);
        let entry = registry.get("tab-1").expect("entry");
        assert_eq!(entry.pid, 11);
        assert_eq!(entry.cwd, None);
    }

    #[test]
    fn remove_clears_focus() {
        let registry = SessionRegistry::new();
        registry.register("tab-1", 10, None);
        registry.register("tab-2", 20, None);
        registry.focus("tab-1");
        assert_eq!(registry.focused().as_deref(), Some("tab-1"));

        registry.remove("tab-2");
        assert_eq!(registry.focused().as_deref(), Some("tab-1"));

        let removed = registry.remove("tab-1").expect("removed");
        assert_eq!(removed.pid, 10);
        assert_eq!(registry.focused(), None);
        assert!(registry.resolution_lock("tab-1").is_none());
    }

    #[test]
    fn entries_are_sorted_by_uid() {
        let registry = SessionRegistry::new();
        registry.register("b", 2, None);
        registry.register("a", 1, None);
        let uids = registry
            .entries()
            .into_iter()
            .map(|entry| entry.uid)
            .collect::<Vec<_>>();
        assert_eq!(uids, vec!["a", "b"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn resolution_lock_is_shared_per_tab() {
        let registry = SessionRegistry::new();
        registry.register("tab-1", 10, None);
        registry.register("tab-2", 20, None);
        let first = registry.resolution_lock("tab-1").expect("lock");
        let again = registry.resolution_lock("tab-1").expect("lock");
        let other = registry.resolution_lock("tab-2").expect("lock");
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
