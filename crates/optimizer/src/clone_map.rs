//! Label identity under cloning.
//!
//! When an instruction range with internal jump targets is duplicated (loop
//! unrolling, range cloning), every source label must map to exactly one
//! fresh label per cloning session: two references to the same source label
//! stay consistent with each other and distinct from every other label.

use rustc_hash::FxHashMap;

use crate::LabelId;

/// A clone-session map from source labels to their fresh duplicates.
///
/// Scoped to one cloning operation; never shared across sessions.
#[derive(Debug, Default)]
pub struct CloneMap {
    map: FxHashMap<LabelId, LabelId>,
}

impl CloneMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates a source label, allocating the fresh label on first sight.
    ///
    /// Repeated lookups of the same source label within this session return
    /// the same fresh label.
    pub fn translate(&mut self, old: LabelId, alloc: impl FnOnce() -> LabelId) -> LabelId {
        *self.map.entry(old).or_insert_with(alloc)
    }

    /// Looks up an already-translated label without allocating
    pub fn get(&self, old: LabelId) -> Option<LabelId> {
        self.map.get(&old).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
