//! In-memory trigger index
//!
//! The index is the only shared mutable state inside the engine: a
//! namespace-partitioned map of triggers guarded by a single
//! reader/writer lock. Readers get cloned snapshots; writers hold the
//! lock only for the map operation itself, never across I/O.

use std::collections::HashMap;
use std::sync::RwLock;

use shared::Trigger;

/// Namespace -> trigger name -> Trigger
type IndexMap = HashMap<String, HashMap<String, Trigger>>;

/// Thread-safe, namespace-partitioned index of trigger definitions
#[derive(Debug, Default)]
pub struct TriggerIndex {
    triggers: RwLock<IndexMap>,
}

impl TriggerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the entire index with `triggers`
    pub fn replace_all(&self, triggers: HashMap<String, HashMap<String, Trigger>>) {
        let mut guard = self.triggers.write().expect("trigger index lock poisoned");
        *guard = triggers;
    }

    /// Insert or replace the trigger at `(namespace, name)`.
    ///
    /// Idempotent: first-seen and updated triggers are handled identically,
    /// last write wins.
    pub fn upsert(&self, namespace: &str, name: &str, trigger: Trigger) {
        let mut guard = self.triggers.write().expect("trigger index lock poisoned");
        guard
            .entry(namespace.to_string())
            .or_default()
            .insert(name.to_string(), trigger);
    }

    /// Remove the trigger at `(namespace, name)`, if present.
    ///
    /// Removing an absent entry is not an error.
    pub fn remove(&self, namespace: &str, name: &str) {
        let mut guard = self.triggers.write().expect("trigger index lock poisoned");
        if let Some(ns) = guard.get_mut(namespace) {
            ns.remove(name);
            if ns.is_empty() {
                guard.remove(namespace);
            }
        }
    }

    /// Snapshot of all triggers under `namespace`.
    ///
    /// Returns an empty vec for an unknown namespace.
    pub fn get(&self, namespace: &str) -> Vec<Trigger> {
        let guard = self.triggers.read().expect("trigger index lock poisoned");
        guard
            .get(namespace)
            .map(|ns| ns.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of all triggers across every namespace
    pub fn get_all(&self) -> Vec<Trigger> {
        let guard = self.triggers.read().expect("trigger index lock poisoned");
        guard
            .values()
            .flat_map(|ns| ns.values().cloned())
            .collect()
    }
}
