//! Local value inlining: a forward dataflow walk that tracks which local
//! slots hold a known constant and rewrites loads of those slots into the
//! constant itself.
//!
//! The known-value map is discarded at every control-flow merge or transfer
//! (labels, branches, jumps, calls), so only straight-line knowledge is ever
//! used.

use rustc_hash::FxHashMap;

use crate::inspect::prev_in_block;
use crate::passes::{Pass, PassContext};
use crate::{ConstValue, Instruction, InsnId, InsnKind, MethodBody, OptError};

#[derive(Debug, Default)]
pub struct LocalValueInline;

impl LocalValueInline {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for LocalValueInline {
    fn run(
        &mut self,
        method: &mut MethodBody,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        let mut known: FxHashMap<u16, ConstValue> = FxHashMap::default();
        let mut replacements: Vec<(InsnId, ConstValue)> = Vec::new();

        for (id, insn) in method.insns.iter() {
            match &insn.kind {
                // Any control-flow boundary invalidates straight-line facts
                InsnKind::Label(_)
                | InsnKind::Branch { .. }
                | InsnKind::Goto { .. }
                | InsnKind::Call { .. } => known.clear(),
                InsnKind::StoreLocal { slot, .. } => {
                    let stored = prev_in_block(&method.insns, id).and_then(|prev| {
                        match method.insns.kind(prev) {
                            Some(InsnKind::Const(value)) => Some(value.clone()),
                            _ => None,
                        }
                    });
                    match stored {
                        Some(value) => {
                            known.insert(*slot, value);
                        }
                        None => {
                            known.remove(slot);
                        }
                    }
                }
                InsnKind::IncrLocal { slot, delta } => {
                    let updated = match known.get(slot) {
                        Some(ConstValue::I32(v)) => Some(ConstValue::I32(v.wrapping_add(*delta))),
                        Some(ConstValue::I64(v)) => {
                            Some(ConstValue::I64(v.wrapping_add(i64::from(*delta))))
                        }
                        _ => None,
                    };
                    match updated {
                        Some(value) => {
                            known.insert(*slot, value);
                        }
                        None => {
                            known.remove(slot);
                        }
                    }
                }
                InsnKind::LoadLocal { slot, width } => {
                    if let Some(value) = known.get(slot) {
                        if value.width() == *width {
                            replacements.push((id, value.clone()));
                        }
                    }
                }
                _ => {}
            }
        }

        let changed = !replacements.is_empty();
        for (id, value) in replacements {
            method.insns.replace(id, Instruction::const_value(value));
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "LocalValueInline"
    }
}
