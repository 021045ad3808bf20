//! Deduplicated lineage sets keyed by `(tier, chunkIndex)`.

use std::collections::BTreeMap;

use strata_types::LineageKey;

/// Merge two lineage slices, keyed by `(tier, chunkIndex)`.
///
/// Incoming entries overwrite same-keyed base entries; the result is
/// sorted by `(tier, index)` ascending. Merging is idempotent, and for
/// any key the final entry depends only on the last source that supplied
/// it — duplicate identical entries change nothing.
pub fn merge_lineage(base: &[LineageKey], incoming: &[LineageKey]) -> Vec<LineageKey> {
    let mut set = LineageSet::from_entries(base.iter().cloned());
    set.merge(incoming.iter().cloned());
    set.into_entries()
}

/// A transient, deduplicated collection of lineage entries for one
/// reconstruction attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageSet {
    entries: BTreeMap<(u32, u32), LineageKey>,
}

impl LineageSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from an entry iterator (later duplicates win).
    pub fn from_entries(entries: impl IntoIterator<Item = LineageKey>) -> Self {
        let mut set = Self::new();
        set.merge(entries);
        set
    }

    /// Insert one entry, replacing any same-keyed entry.
    pub fn insert(&mut self, entry: LineageKey) {
        self.entries.insert((entry.tier, entry.chunk_index), entry);
    }

    /// Fold in more entries; incoming entries win on key collision.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = LineageKey>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    /// Look up the entry for a chunk.
    pub fn get(&self, tier: u32, chunk_index: u32) -> Option<&LineageKey> {
        self.entries.get(&(tier, chunk_index))
    }

    /// Whether an entry exists for a chunk.
    pub fn contains(&self, tier: u32, chunk_index: u32) -> bool {
        self.entries.contains_key(&(tier, chunk_index))
    }

    /// Iterate entries in `(tier, index)` ascending order.
    pub fn entries(&self) -> impl Iterator<Item = &LineageKey> {
        self.entries.values()
    }

    /// Consume the set, yielding sorted entries.
    pub fn into_entries(self) -> Vec<LineageKey> {
        self.entries.into_values().collect()
    }

    /// Number of distinct `(tier, index)` keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
