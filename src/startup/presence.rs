//! Keyed entry/exit transitions
//!
//! [`Presence`] diffs successive keyed lists. Keys that appear fade in, keys
//! that disappear stay rendered while they fade out and are dropped once the
//! exit finishes. Keys present in both lists keep their running transition,
//! so unrelated changes never replay an animation.

use std::time::{Duration, Instant};

/// Durations of the entry and exit transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionSpec {
    pub enter: Duration,
    pub exit: Duration,
}

impl TransitionSpec {
    pub fn new(enter: Duration, exit: Duration) -> Self {
        Self { enter, exit }
    }

    /// No animation; keys appear and vanish immediately
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_millis(400))
    }
}

#[derive(Debug, Clone)]
struct PresenceEntry<K> {
    key: K,
    since: Instant,
    exiting: bool,
}

/// Result of syncing a new key list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceDiff<K> {
    pub entered: Vec<K>,
    pub exited: Vec<K>,
}

impl<K> PresenceDiff<K> {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Presence<K> {
    entries: Vec<PresenceEntry<K>>,
    spec: TransitionSpec,
}

impl<K: Clone + PartialEq> Presence<K> {
    pub fn new(spec: TransitionSpec) -> Self {
        Self {
            entries: Vec::new(),
            spec,
        }
    }

    /// Replace the mounted key list, starting enter/exit transitions at `now`.
    ///
    /// Mounted keys follow the order of `keys`; exiting keys keep their
    /// previous position as closely as possible.
    pub fn sync(&mut self, keys: &[K], now: Instant) -> PresenceDiff<K> {
        self.prune(now);

        let mut entered = Vec::new();
        let mut next: Vec<PresenceEntry<K>> = keys
            .iter()
            .map(|key| match self.entries.iter().find(|e| &e.key == key) {
                Some(existing) if !existing.exiting => existing.clone(),
                _ => {
                    entered.push(key.clone());
                    PresenceEntry {
                        key: key.clone(),
                        since: now,
                        exiting: false,
                    }
                }
            })
            .collect();

        let mut exited = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if keys.contains(&entry.key) {
                continue;
            }
            let exiting = if entry.exiting {
                entry.clone()
            } else {
                exited.push(entry.key.clone());
                PresenceEntry {
                    key: entry.key.clone(),
                    since: now,
                    exiting: true,
                }
            };
            next.insert(index.min(next.len()), exiting);
        }

        self.entries = next;
        self.prune(now);
        PresenceDiff { entered, exited }
    }

    /// Drop keys whose exit transition has finished
    pub fn prune(&mut self, now: Instant) {
        let exit = self.spec.exit;
        self.entries
            .retain(|entry| !entry.exiting || now.saturating_duration_since(entry.since) < exit);
    }

    /// Opacity in `0.0..=1.0`, or `None` when the key is not rendered at all
    pub fn opacity(&self, key: &K, now: Instant) -> Option<f64> {
        let entry = self.entries.iter().find(|e| &e.key == key)?;
        Some(self.entry_opacity(entry, now))
    }

    /// Rendered keys in display order with their opacity
    pub fn visible(&self, now: Instant) -> Vec<(K, f64)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.clone(), self.entry_opacity(entry, now)))
            .collect()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|e| &e.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry_opacity(&self, entry: &PresenceEntry<K>, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(entry.since);
        if entry.exiting {
            1.0 - fraction(elapsed, self.spec.exit)
        } else {
            fraction(elapsed, self.spec.enter)
        }
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).min(1.0)
}
