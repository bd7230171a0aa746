//! # Predicate Library
//!
//! Small composable boolean classifiers over instruction nodes and method
//! metadata, used to keep pass logic declarative.

use crate::{InsnKind, MethodBody, Width};

/// A numeric (non-reference) constant
pub const fn is_numeric_const(kind: &InsnKind) -> bool {
    match kind {
        InsnKind::Const(value) => value.width().is_numeric(),
        _ => false,
    }
}

/// An integer constant of either width
pub const fn is_int_const(kind: &InsnKind) -> bool {
    match kind {
        InsnKind::Const(value) => value.width().is_integer(),
        _ => false,
    }
}

/// An array-element load of the given width
pub fn is_array_load_of(kind: &InsnKind, width: Width) -> bool {
    matches!(kind, InsnKind::ArrayLoad { width: w } if *w == width)
}

/// Any conditional branch
pub const fn is_conditional_branch(kind: &InsnKind) -> bool {
    matches!(kind, InsnKind::Branch { .. })
}

/// An unconditional jump
pub const fn is_goto(kind: &InsnKind) -> bool {
    matches!(kind, InsnKind::Goto { .. })
}

/// A safe split-point sentinel
pub const fn is_split_marker(kind: &InsnKind) -> bool {
    matches!(kind, InsnKind::Nop)
}

/// A write to the given local slot (`StoreLocal` or `IncrLocal`)
pub const fn writes_local(kind: &InsnKind, slot: u16) -> bool {
    match kind {
        InsnKind::StoreLocal { slot: s, .. } | InsnKind::IncrLocal { slot: s, .. } => *s == slot,
        _ => false,
    }
}

/// A read of the given local slot
pub const fn reads_local(kind: &InsnKind, slot: u16) -> bool {
    match kind {
        InsnKind::LoadLocal { slot: s, .. } | InsnKind::IncrLocal { slot: s, .. } => *s == slot,
        _ => false,
    }
}

/// Gate: is this method declared eligible for optimization at all?
pub const fn is_optimization_candidate(method: &MethodBody) -> bool {
    method.markers.optimizable
}

/// Gate: does this method declare strict, statically unrollable loops?
pub const fn is_strict_loop_candidate(method: &MethodBody) -> bool {
    method.markers.strict_loops
}
