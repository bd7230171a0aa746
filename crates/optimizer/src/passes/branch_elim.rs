//! Constant-branch elimination: decides conditional branches whose operands
//! are statically known and rewrites the control flow accordingly.
//!
//! A branch decided not-taken loses its operands and itself. A branch
//! decided taken additionally tries to delete the skipped region; when the
//! region is still reachable from elsewhere (or the jump is backward), the
//! branch degrades to an unconditional `Goto` instead, chasing trivial goto
//! chains to their final anchor.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use crate::inspect::{const_ending_at, next_meaningful, prev_in_block};
use crate::passes::{Pass, PassContext};
use crate::{
    BranchCond, ConstValue, InsnId, InsnKind, Instruction, LabelId, MethodBody, OptError,
};

#[derive(Debug, Default)]
pub struct BranchEliminate;

impl BranchEliminate {
    pub fn new() -> Self {
        Self
    }
}

/// A decided branch: whether it is taken and which operand-producing
/// instructions go with it
struct Decision {
    taken: bool,
    operands: Vec<InsnId>,
}

impl Pass for BranchEliminate {
    fn run(
        &mut self,
        method: &mut MethodBody,
        cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        let mut changed = false;
        for id in method.insns.ids() {
            let Some(InsnKind::Branch { cond, target }) = method.insns.kind(id).cloned() else {
                continue;
            };
            let Some(decision) = decide(method, cx, id, cond) else {
                continue;
            };
            // Consume any facts whose chains we are about to delete
            for &operand in &decision.operands {
                cx.facts.take(operand);
            }
            apply(method, id, target, decision)?;
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "BranchEliminate"
    }
}

/// Tries to statically decide the branch at `id`
fn decide(
    method: &MethodBody,
    cx: &PassContext<'_>,
    id: InsnId,
    cond: BranchCond,
) -> Option<Decision> {
    let list = &method.insns;
    let prev = prev_in_block(list, id)?;

    if cond.is_reference() {
        return decide_reference(method, cx, prev, cond);
    }

    if cond.operand_count() == 2 {
        // Two integer operands, both constant
        let right = const_ending_at(list, prev)?;
        let left = const_ending_at(list, prev_in_block(list, right.first())?)?;
        let taken = cond.eval_icmp(left.value.as_int()?, right.value.as_int()?)?;
        let mut operands = left.insns.to_vec();
        operands.extend(right.insns.iter().copied());
        return Some(Decision { taken, operands });
    }

    // Single integer operand: either a Compare result or a bare constant
    if let Some(InsnKind::Compare { width }) = list.kind(prev) {
        let width = *width;
        let right = const_ending_at(list, prev_in_block(list, prev)?)?;
        let left = const_ending_at(list, prev_in_block(list, right.first())?)?;
        if left.value.width() != width || right.value.width() != width {
            return None;
        }
        let sign = compare_sign(&left.value, &right.value)?;
        let taken = cond.eval_sign(sign)?;
        let mut operands = left.insns.to_vec();
        operands.extend(right.insns.iter().copied());
        operands.push(prev);
        return Some(Decision { taken, operands });
    }

    let window = const_ending_at(list, prev)?;
    let taken = cond.eval_sign(window.value.sign()?)?;
    Some(Decision {
        taken,
        operands: window.insns.to_vec(),
    })
}

/// The ternary sign a `Compare` instruction would push for two constants.
/// `None` for NaN operands, whose ordering is width-specific at runtime.
fn compare_sign(left: &ConstValue, right: &ConstValue) -> Option<i32> {
    let ord = match (left, right) {
        (ConstValue::I32(a), ConstValue::I32(b)) => a.cmp(b),
        (ConstValue::I64(a), ConstValue::I64(b)) => a.cmp(b),
        (ConstValue::F32(a), ConstValue::F32(b)) => a.partial_cmp(b)?,
        (ConstValue::F64(a), ConstValue::F64(b)) => a.partial_cmp(b)?,
        _ => return None,
    };
    Some(match ord {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

/// Decides a null/non-null or reference-identity branch
fn decide_reference(
    method: &MethodBody,
    cx: &PassContext<'_>,
    prev: InsnId,
    cond: BranchCond,
) -> Option<Decision> {
    let list = &method.insns;
    let right = reference_operand(method, cx, prev)?;

    match cond {
        BranchCond::Null => Some(Decision {
            taken: right.is_null,
            operands: right.insns,
        }),
        BranchCond::NonNull => Some(Decision {
            taken: !right.is_null,
            operands: right.insns,
        }),
        BranchCond::RefEq | BranchCond::RefNe => {
            let left_end = prev_in_block(list, right.insns[0])?;
            let left = reference_operand(method, cx, left_end)?;
            // Two known non-null references have unknowable identity
            let equal = match (left.is_null, right.is_null) {
                (true, true) => true,
                (true, false) | (false, true) => false,
                (false, false) => return None,
            };
            let taken = if cond == BranchCond::RefEq { equal } else { !equal };
            let mut operands = left.insns;
            operands.extend(right.insns);
            Some(Decision { taken, operands })
        }
        _ => None,
    }
}

/// A reference operand with a known nullness
struct RefOperand {
    is_null: bool,
    /// Producing instructions in list order
    insns: Vec<InsnId>,
}

/// Classifies the reference value ending at `id`: a null constant, or an
/// access chain the value inliner proved non-null this round
fn reference_operand(method: &MethodBody, cx: &PassContext<'_>, id: InsnId) -> Option<RefOperand> {
    match method.insns.kind(id) {
        Some(InsnKind::Const(ConstValue::Null)) => Some(RefOperand {
            is_null: true,
            insns: vec![id],
        }),
        _ => cx.facts.ending_at(id).map(|fact| RefOperand {
            is_null: false,
            insns: fact.chain.to_vec(),
        }),
    }
}

/// Rewrites the list for a decided branch
fn apply(
    method: &mut MethodBody,
    id: InsnId,
    target: LabelId,
    decision: Decision,
) -> Result<(), OptError> {
    if !decision.taken {
        for operand in decision.operands {
            method.insns.remove(operand);
        }
        method.insns.remove(id);
        return Ok(());
    }

    let target_pos = method.insns.label_position(target).ok_or_else(|| {
        OptError::malformed(format!("branch targets undefined label L{}", target.index()))
    })?;

    match forward_region(method, id, target_pos) {
        Some(region) if region_is_isolated(method, id, &region) => {
            for operand in decision.operands {
                method.insns.remove(operand);
            }
            for insn in region {
                method.insns.remove(insn);
            }
            method.insns.remove(id);
        }
        _ => {
            // The skipped code stays reachable; degrade to a plain jump
            for operand in decision.operands {
                method.insns.remove(operand);
            }
            let resolved = chase_gotos(method, target);
            method.insns.replace(id, Instruction::goto(resolved));
        }
    }
    Ok(())
}

/// The instructions strictly between `id` and `target_pos`, or `None` when
/// the target is not forward of `id`
fn forward_region(method: &MethodBody, id: InsnId, target_pos: InsnId) -> Option<Vec<InsnId>> {
    let mut region = Vec::new();
    let mut cur = method.insns.next(id);
    while let Some(next) = cur {
        if next == target_pos {
            return Some(region);
        }
        region.push(next);
        cur = method.insns.next(next);
    }
    None
}

/// Whether no label inside the region is referenced from outside it (the
/// deciding branch itself excluded)
fn region_is_isolated(method: &MethodBody, branch: InsnId, region: &[InsnId]) -> bool {
    let members: FxHashSet<InsnId> = region.iter().copied().collect();
    let defined: FxHashSet<LabelId> = region
        .iter()
        .filter_map(|&id| match method.insns.kind(id) {
            Some(InsnKind::Label(label)) => Some(*label),
            _ => None,
        })
        .collect();
    if defined.is_empty() {
        return true;
    }
    for (id, insn) in method.insns.iter() {
        if id == branch || members.contains(&id) {
            continue;
        }
        if let Some(target) = insn.jump_target() {
            if defined.contains(&target) {
                return false;
            }
        }
    }
    true
}

/// Follows trivial goto chains (`Label; Goto`) to the final anchor,
/// guarding against cycles
fn chase_gotos(method: &MethodBody, start: LabelId) -> LabelId {
    let mut visited = FxHashSet::default();
    let mut current = start;
    while visited.insert(current) {
        let Some(pos) = method.insns.label_position(current) else {
            break;
        };
        let Some(next) = next_meaningful(&method.insns, pos) else {
            break;
        };
        match method.insns.kind(next) {
            Some(InsnKind::Goto { target }) => current = *target,
            _ => break,
        }
    }
    current
}
