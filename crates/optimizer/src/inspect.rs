//! # Instruction Introspection
//!
//! Pure helpers that classify and navigate instruction nodes: block-local
//! neighbor lookup for operand matching, label-crossing lookup for control
//! flow queries, constant-operand window extraction with optional casts,
//! and width conversions.

use smallvec::{smallvec, SmallVec};

use crate::{ConstValue, InsnId, InsnKind, InsnList, Width};

/// Returns true if the instruction affects execution (not a label or a
/// split sentinel)
pub const fn is_meaningful(kind: &InsnKind) -> bool {
    !matches!(kind, InsnKind::Label(_) | InsnKind::Nop)
}

/// The next meaningful instruction after `id`, crossing labels.
///
/// Only for control-flow queries (goto chasing, anchor lookup) where the
/// label itself is the thing being skipped. Operand matching must use
/// [`next_in_block`] instead.
pub fn next_meaningful(list: &InsnList, id: InsnId) -> Option<InsnId> {
    let mut cur = list.next(id);
    while let Some(next) = cur {
        if list.kind(next).is_some_and(is_meaningful) {
            return Some(next);
        }
        cur = list.next(next);
    }
    None
}

/// The next meaningful instruction after `id` on the same straight-line
/// path.
///
/// Skips `Nop`, which is stack-neutral and never a jump target, but stops
/// at `Label`: a label is a control-flow join, and an operand that appears
/// to flow across it may be supplied by a different in-edge at runtime.
pub fn next_in_block(list: &InsnList, id: InsnId) -> Option<InsnId> {
    let mut cur = list.next(id);
    while let Some(next) = cur {
        match list.kind(next)? {
            InsnKind::Nop => cur = list.next(next),
            InsnKind::Label(_) => return None,
            _ => return Some(next),
        }
    }
    None
}

/// The previous meaningful instruction before `id` on the same
/// straight-line path; the backward counterpart of [`next_in_block`].
pub fn prev_in_block(list: &InsnList, id: InsnId) -> Option<InsnId> {
    let mut cur = list.prev(id);
    while let Some(prev) = cur {
        match list.kind(prev)? {
            InsnKind::Nop => cur = list.prev(prev),
            InsnKind::Label(_) => return None,
            _ => return Some(prev),
        }
    }
    None
}

/// A constant-producing instruction window: a `Const`, optionally widened or
/// narrowed by a trailing `Cast`.
///
/// Captures the consumed instruction ids so a pass can remove the whole
/// window in one transaction.
#[derive(Debug, Clone)]
pub struct ConstOperand {
    /// The instructions the window spans, in list order
    pub insns: SmallVec<[InsnId; 2]>,
    /// The value after applying the optional cast
    pub value: ConstValue,
}

impl ConstOperand {
    /// First instruction of the window
    pub fn first(&self) -> InsnId {
        self.insns[0]
    }

    /// Last instruction of the window
    pub fn last(&self) -> InsnId {
        self.insns[self.insns.len() - 1]
    }
}

/// Matches a constant operand window whose last instruction is `id`.
///
/// Accepts either a bare `Const` or `Const` followed by a matching `Cast`.
pub fn const_ending_at(list: &InsnList, id: InsnId) -> Option<ConstOperand> {
    match list.kind(id)? {
        InsnKind::Const(value) => Some(ConstOperand {
            insns: smallvec![id],
            value: value.clone(),
        }),
        InsnKind::Cast { from, to } => {
            let prev = prev_in_block(list, id)?;
            match list.kind(prev)? {
                InsnKind::Const(value) if value.width() == *from => {
                    let value = cast_value(value, *to)?;
                    Some(ConstOperand {
                        insns: smallvec![prev, id],
                        value,
                    })
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Converts a numeric constant to another numeric width.
///
/// Integer narrowing truncates; float-to-integer conversion saturates and
/// maps NaN to zero. Reference values never convert.
pub fn cast_value(value: &ConstValue, to: Width) -> Option<ConstValue> {
    if value.width() == to {
        return Some(value.clone());
    }
    let out = match (value, to) {
        (ConstValue::I32(v), Width::I64) => ConstValue::I64(i64::from(*v)),
        (ConstValue::I32(v), Width::F32) => ConstValue::F32(*v as f32),
        (ConstValue::I32(v), Width::F64) => ConstValue::F64(f64::from(*v)),
        (ConstValue::I64(v), Width::I32) => ConstValue::I32(*v as i32),
        (ConstValue::I64(v), Width::F32) => ConstValue::F32(*v as f32),
        (ConstValue::I64(v), Width::F64) => ConstValue::F64(*v as f64),
        (ConstValue::F32(v), Width::I32) => ConstValue::I32(*v as i32),
        (ConstValue::F32(v), Width::I64) => ConstValue::I64(*v as i64),
        (ConstValue::F32(v), Width::F64) => ConstValue::F64(f64::from(*v)),
        (ConstValue::F64(v), Width::I32) => ConstValue::I32(*v as i32),
        (ConstValue::F64(v), Width::I64) => ConstValue::I64(*v as i64),
        (ConstValue::F64(v), Width::F32) => ConstValue::F32(*v as f32),
        _ => return None,
    };
    Some(out)
}
