//! Debouncing and periodic rescans
//!
//! Nothing here reads the clock: every call takes `now`, so the host decides
//! where time comes from.

use crate::config::DiagnosticsSettings;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Releases a key once it has been quiet for `delay`
#[derive(Debug, Clone)]
pub struct Debouncer<K: Ord> {
    delay: Duration,
    pending: BTreeMap<K, Instant>,
}

impl<K: Ord + Clone> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
        }
    }

    /// Record activity on `key`, restarting its quiet period
    pub fn touch(&mut self, key: K, now: Instant) {
        self.pending.insert(key, now);
    }

    /// Remove and return every key that has been quiet long enough
    pub fn due(&mut self, now: Instant) -> Vec<K> {
        let ready: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= self.delay)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &ready {
            self.pending.remove(key);
        }
        ready
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// What the host should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Reload the hint model from disk
    ReloadHints,
    /// Re-diagnose every file with a fresh dependency graph
    FullRescan,
    /// Re-diagnose these files and their dependents
    Diagnose(Vec<PathBuf>),
}

/// Turns file change notifications into diagnosis work
#[derive(Debug, Clone)]
pub struct DiagnosticScheduler {
    files: Debouncer<PathBuf>,
    hints: Debouncer<()>,
    rescan_interval: Duration,
    last_rescan: Option<Instant>,
}

impl DiagnosticScheduler {
    pub fn new(file_delay: Duration, hint_delay: Duration, rescan_interval: Duration) -> Self {
        Self {
            files: Debouncer::new(file_delay),
            hints: Debouncer::new(hint_delay),
            rescan_interval,
            last_rescan: None,
        }
    }

    pub fn from_settings(settings: &DiagnosticsSettings) -> Self {
        Self::new(
            settings.file_debounce(),
            settings.hint_debounce(),
            settings.rescan_interval(),
        )
    }

    pub fn file_changed(&mut self, path: PathBuf, now: Instant) {
        self.files.touch(path, now);
    }

    pub fn hints_changed(&mut self, now: Instant) {
        self.hints.touch((), now);
    }

    /// Actions due at `now`
    ///
    /// The first poll always asks for a full rescan. A hint reload is always
    /// followed by a full rescan, which also covers pending file changes.
    pub fn poll(&mut self, now: Instant) -> Vec<ScheduledAction> {
        let mut actions = Vec::new();
        if !self.hints.due(now).is_empty() {
            actions.push(ScheduledAction::ReloadHints);
            self.start_rescan(now, &mut actions);
            return actions;
        }

        let rescan_due = self
            .last_rescan
            .is_none_or(|last| now.saturating_duration_since(last) >= self.rescan_interval);
        if rescan_due {
            self.start_rescan(now, &mut actions);
            return actions;
        }

        let changed = self.files.due(now);
        if !changed.is_empty() {
            actions.push(ScheduledAction::Diagnose(changed));
        }
        actions
    }

    fn start_rescan(&mut self, now: Instant, actions: &mut Vec<ScheduledAction>) {
        self.files.clear();
        self.last_rescan = Some(now);
        actions.push(ScheduledAction::FullRescan);
    }

    /// Whether anything is waiting for its quiet period to end
    pub fn has_pending(&self) -> bool {
        !self.files.is_empty() || !self.hints.is_empty()
    }
}
