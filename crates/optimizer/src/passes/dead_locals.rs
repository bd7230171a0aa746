//! Dead local-store removal: deletes a store whose slot is overwritten or
//! whose method returns before any read, together with the pure instruction
//! that produced the stored value.
//!
//! The forward scan is strictly straight-line; the first control-flow
//! boundary after a store keeps it (the value might be read on another
//! path).

use crate::inspect::prev_in_block;
use crate::passes::{Pass, PassContext};
use crate::{InsnId, InsnKind, MethodBody, OptError};

#[derive(Debug, Default)]
pub struct DeadLocalStores;

impl DeadLocalStores {
    pub fn new() -> Self {
        Self
    }
}

/// Whether the write at `id` to `slot` is dead: every straight-line path
/// from it reaches an overwrite or a return before any read.
fn is_dead_write(method: &MethodBody, id: InsnId, slot: u16) -> bool {
    let mut cur = method.insns.next(id);
    while let Some(next) = cur {
        match method.insns.kind(next) {
            Some(InsnKind::LoadLocal { slot: s, .. }) if *s == slot => return false,
            Some(InsnKind::IncrLocal { slot: s, .. }) if *s == slot => return false,
            Some(InsnKind::StoreLocal { slot: s, .. }) if *s == slot => return true,
            Some(InsnKind::Return { .. }) => return true,
            Some(
                InsnKind::Label(_)
                | InsnKind::Branch { .. }
                | InsnKind::Goto { .. }
                | InsnKind::Call { .. },
            ) => return false,
            _ => {}
        }
        cur = method.insns.next(next);
    }
    // Falling off the end without a read
    true
}

/// A pure producer that pushes exactly one value and can vanish with its
/// consumer
const fn is_removable_producer(kind: &InsnKind) -> bool {
    matches!(
        kind,
        InsnKind::Const(_) | InsnKind::LoadLocal { .. } | InsnKind::GetField { .. }
    )
}

impl Pass for DeadLocalStores {
    fn run(
        &mut self,
        method: &mut MethodBody,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        let mut changed = false;
        for id in method.insns.ids() {
            match method.insns.kind(id).cloned() {
                Some(InsnKind::StoreLocal { slot, .. }) => {
                    if !is_dead_write(method, id, slot) {
                        continue;
                    }
                    // The store pops one value; only remove it when its
                    // producer can be removed too, so the stack stays
                    // balanced.
                    let producer = prev_in_block(&method.insns, id);
                    let removable = producer
                        .and_then(|p| method.insns.kind(p))
                        .is_some_and(is_removable_producer);
                    if !removable {
                        continue;
                    }
                    if let Some(producer) = producer {
                        method.insns.remove(producer);
                    }
                    method.insns.remove(id);
                    changed = true;
                }
                Some(InsnKind::IncrLocal { slot, .. }) => {
                    // Stack-neutral, so a dead increment vanishes on its own
                    if is_dead_write(method, id, slot) {
                        method.insns.remove(id);
                        changed = true;
                    }
                }
                _ => {}
            }
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "DeadLocalStores"
    }
}
