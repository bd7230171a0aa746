//! # Instruction List
//!
//! The mutable IR substrate every pass rewrites: an ordered, doubly-linked
//! sequence of instructions backed by an arena of stable slots.
//!
//! # Design Notes
//!
//! - Instructions are addressed by `InsnId` handles; removal tombstones a
//!   slot instead of shifting neighbors, so handles held by a pass stay
//!   stable across arbitrary insertions and removals
//! - A tombstone keeps the links it had at removal time, so a cursor parked
//!   on a removed instruction can still walk out of the removed region (it
//!   resumes at the at-removal successor)
//! - Every `Branch`/`Goto` target must be a `Label` defined exactly once in
//!   the same list; `validate` checks the invariant after structural edits

use index_vec::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{CloneMap, InsnId, InsnKind, Instruction, LabelId, OptError, PrettyPrint};

#[derive(Debug, Clone)]
struct Slot {
    prev: Option<InsnId>,
    next: Option<InsnId>,
    /// `None` marks a tombstone
    insn: Option<Instruction>,
}

/// An ordered instruction sequence owning its instructions.
#[derive(Debug, Clone, Default)]
pub struct InsnList {
    slots: IndexVec<InsnId, Slot>,
    head: Option<InsnId>,
    tail: Option<InsnId>,
    live: usize,
    /// Position of each defined label
    labels: FxHashMap<LabelId, InsnId>,
    next_label: usize,
}

impl InsnList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instructions
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocates a label unique within this list
    pub fn fresh_label(&mut self) -> LabelId {
        let id = LabelId::new(self.next_label);
        self.next_label += 1;
        id
    }

    /// Appends an instruction at the end
    pub fn push_back(&mut self, insn: Instruction) -> InsnId {
        self.note_labels(&insn);
        let id = self.slots.push(Slot {
            prev: self.tail,
            next: None,
            insn: Some(insn),
        });
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.live += 1;
        self.index_label(id);
        id
    }

    /// Inserts an instruction after a live anchor
    pub fn insert_after(&mut self, anchor: InsnId, insn: Instruction) -> InsnId {
        debug_assert!(self.slots[anchor].insn.is_some(), "anchor is a tombstone");
        self.note_labels(&insn);
        let next = self.slots[anchor].next;
        let id = self.slots.push(Slot {
            prev: Some(anchor),
            next,
            insn: Some(insn),
        });
        self.slots[anchor].next = Some(id);
        match next {
            Some(next) => self.slots[next].prev = Some(id),
            None => self.tail = Some(id),
        }
        self.live += 1;
        self.index_label(id);
        id
    }

    /// Inserts an instruction before a live anchor
    pub fn insert_before(&mut self, anchor: InsnId, insn: Instruction) -> InsnId {
        debug_assert!(self.slots[anchor].insn.is_some(), "anchor is a tombstone");
        match self.slots[anchor].prev {
            Some(prev) => self.insert_after(prev, insn),
            None => {
                self.note_labels(&insn);
                let id = self.slots.push(Slot {
                    prev: None,
                    next: Some(anchor),
                    insn: Some(insn),
                });
                self.slots[anchor].prev = Some(id);
                self.head = Some(id);
                self.live += 1;
                self.index_label(id);
                id
            }
        }
    }

    /// Removes an instruction, returning its payload.
    ///
    /// The slot becomes a tombstone that keeps its at-removal links.
    pub fn remove(&mut self, id: InsnId) -> Option<Instruction> {
        let insn = self.slots[id].insn.take()?;
        let (prev, next) = (self.slots[id].prev, self.slots[id].next);
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        if let InsnKind::Label(label) = insn.kind {
            self.labels.remove(&label);
        }
        self.live -= 1;
        Some(insn)
    }

    /// Replaces the payload of a live instruction in place, returning the
    /// old payload
    pub fn replace(&mut self, id: InsnId, insn: Instruction) -> Option<Instruction> {
        self.slots[id].insn.as_ref()?;
        self.note_labels(&insn);
        let old = self.slots[id].insn.replace(insn);
        if let Some(Instruction {
            kind: InsnKind::Label(label),
            ..
        }) = &old
        {
            self.labels.remove(label);
        }
        self.index_label(id);
        old
    }

    /// The instruction at `id`, or `None` for a tombstone
    pub fn get(&self, id: InsnId) -> Option<&Instruction> {
        self.slots.get(id).and_then(|slot| slot.insn.as_ref())
    }

    /// The kind at `id`, or `None` for a tombstone
    pub fn kind(&self, id: InsnId) -> Option<&InsnKind> {
        self.get(id).map(|insn| &insn.kind)
    }

    pub fn first(&self) -> Option<InsnId> {
        self.head
    }

    pub fn last(&self) -> Option<InsnId> {
        self.tail
    }

    /// The next live instruction after `id`.
    ///
    /// Walking from a tombstone resumes at its at-removal successor.
    pub fn next(&self, id: InsnId) -> Option<InsnId> {
        let mut cur = self.slots[id].next;
        while let Some(next) = cur {
            if self.slots[next].insn.is_some() {
                return Some(next);
            }
            cur = self.slots[next].next;
        }
        None
    }

    /// The previous live instruction before `id`
    pub fn prev(&self, id: InsnId) -> Option<InsnId> {
        let mut cur = self.slots[id].prev;
        while let Some(prev) = cur {
            if self.slots[prev].insn.is_some() {
                return Some(prev);
            }
            cur = self.slots[prev].prev;
        }
        None
    }

    /// In-order traversal of live instructions
    pub fn iter(&self) -> impl Iterator<Item = (InsnId, &Instruction)> {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            let id = cur?;
            let insn = self.slots[id].insn.as_ref()?;
            cur = self.next(id);
            Some((id, insn))
        })
    }

    /// Snapshot of the live instruction ids in order.
    ///
    /// Passes iterate over a snapshot so they can freely remove and insert
    /// while walking; removed ids read back as `None`.
    pub fn ids(&self) -> Vec<InsnId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Position of a defined label
    pub fn label_position(&self, label: LabelId) -> Option<InsnId> {
        self.labels.get(&label).copied()
    }

    /// Counts how many branches/gotos reference each label
    pub fn label_reference_counts(&self) -> FxHashMap<LabelId, usize> {
        let mut counts = FxHashMap::default();
        for (_, insn) in self.iter() {
            if let Some(target) = insn.jump_target() {
                *counts.entry(target).or_default() += 1;
            }
        }
        counts
    }

    /// Sum of the encoded sizes of all live instructions
    pub fn total_encoded_size(&self) -> usize {
        self.iter().map(|(_, insn)| insn.encoded_size()).sum()
    }

    /// Clones a range of instructions, translating labels *defined inside
    /// the range* through a fresh clone session so internal jump targets
    /// stay unique per copy. Targets outside the range are preserved.
    pub fn clone_range(&mut self, ids: &[InsnId], map: &mut CloneMap) -> Vec<Instruction> {
        let defined: FxHashSet<LabelId> = ids
            .iter()
            .filter_map(|&id| match self.kind(id) {
                Some(InsnKind::Label(label)) => Some(*label),
                _ => None,
            })
            .collect();

        let mut cloned: Vec<Instruction> = ids
            .iter()
            .filter_map(|&id| self.get(id).cloned())
            .collect();

        for insn in &mut cloned {
            match &mut insn.kind {
                InsnKind::Label(label) => {
                    let next_label = &mut self.next_label;
                    *label = map.translate(*label, || {
                        let id = LabelId::new(*next_label);
                        *next_label += 1;
                        id
                    });
                }
                InsnKind::Branch { target, .. } | InsnKind::Goto { target } => {
                    if defined.contains(target) {
                        let next_label = &mut self.next_label;
                        *target = map.translate(*target, || {
                            let id = LabelId::new(*next_label);
                            *next_label += 1;
                            id
                        });
                    }
                }
                _ => {}
            }
        }
        cloned
    }

    /// Inserts a sequence after `anchor`, preserving order; returns the ids
    pub fn insert_slice_after(&mut self, anchor: InsnId, insns: Vec<Instruction>) -> Vec<InsnId> {
        let mut ids = Vec::with_capacity(insns.len());
        let mut cursor = anchor;
        for insn in insns {
            cursor = self.insert_after(cursor, insn);
            ids.push(cursor);
        }
        ids
    }

    /// Checks the label invariants: every jump targets a label defined
    /// exactly once in this list.
    pub fn validate(&self) -> Result<(), OptError> {
        let mut seen = FxHashSet::default();
        for (_, insn) in self.iter() {
            if let InsnKind::Label(label) = insn.kind {
                if !seen.insert(label) {
                    return Err(OptError::malformed(format!(
                        "label L{} defined more than once",
                        label.index()
                    )));
                }
            }
        }
        for (_, insn) in self.iter() {
            if let Some(target) = insn.jump_target() {
                if !seen.contains(&target) {
                    return Err(OptError::malformed(format!(
                        "jump targets undefined label L{}",
                        target.index()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Renders the list one instruction per line; structural comparison of
    /// renderings backs the idempotence tests.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(_, insn)| insn.pretty_print(0))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn note_labels(&mut self, insn: &Instruction) {
        // Keep the allocator ahead of externally constructed labels
        let watermark = match &insn.kind {
            InsnKind::Label(label) => Some(label.index()),
            InsnKind::Branch { target, .. } | InsnKind::Goto { target } => Some(target.index()),
            _ => None,
        };
        if let Some(watermark) = watermark {
            self.next_label = self.next_label.max(watermark + 1);
        }
    }

    fn index_label(&mut self, id: InsnId) {
        if let Some(InsnKind::Label(label)) = self.kind(id) {
            self.labels.insert(*label, id);
        }
    }
}

impl FromIterator<Instruction> for InsnList {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        let mut list = Self::new();
        for insn in iter {
            list.push_back(insn);
        }
        list
    }
}
