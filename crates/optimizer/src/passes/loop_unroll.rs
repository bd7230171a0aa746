//! Loop unrolling for strict counted loops: a counter initialized to a
//! constant, a test against a constant bound, and a constant stride, with
//! the counter dead outside the loop. The whole loop region is replaced by
//! one body copy per iteration, counter reads folded to the iteration value
//! and a split sentinel planted after each copy.

use rustc_hash::FxHashSet;

use crate::passes::{Pass, PassContext};
use crate::{
    BranchCond, CloneMap, ConstValue, InsnId, InsnKind, Instruction, LabelId, MethodBody,
    OptError, Width,
};

#[derive(Debug, Default)]
pub struct LoopUnroll;

impl LoopUnroll {
    pub fn new() -> Self {
        Self
    }
}

/// A matched counted loop, in ids-snapshot indices
struct CountedLoop {
    /// Index of the initializer constant
    start_idx: usize,
    /// Index of the loop-closing branch
    end_idx: usize,
    /// Body instruction ids, between the body label and the increment
    body: Vec<InsnId>,
    slot: u16,
    start: i32,
    step: i32,
    bound: i32,
    cond: BranchCond,
}

impl Pass for LoopUnroll {
    fn run(
        &mut self,
        method: &mut MethodBody,
        cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        let mut changed = false;
        // Re-snapshot after every rewrite; nested loops unroll inner-first
        // on later rounds once the body stabilizes.
        loop {
            let ids = method.insns.ids();
            let Some((found, iterations)) = find_loop(method, &ids, cx.config.max_unroll_count)
            else {
                break;
            };
            unroll(method, &ids, &found, &iterations);
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "LoopUnroll"
    }
}

/// Scans for the first strict counted loop whose trip count fits the fuse.
/// An unbounded or oversized loop is skipped, not an error.
fn find_loop(
    method: &MethodBody,
    ids: &[InsnId],
    max_count: u32,
) -> Option<(CountedLoop, Vec<i32>)> {
    for i in 0..ids.len() {
        let Some(found) = match_loop_at(method, ids, i) else {
            continue;
        };
        if !loop_is_strict(method, ids, &found) {
            continue;
        }
        if let Some(iterations) = simulate(&found, max_count) {
            return Some((found, iterations));
        }
    }
    None
}

/// Matches the loop shape starting at `ids[i]`:
/// `Const(start); StoreLocal; Goto(Lc); Label(Lb); body; IncrLocal;
/// Label(Lc); LoadLocal; Const(bound); Branch(cond, Lb)`
fn match_loop_at(method: &MethodBody, ids: &[InsnId], i: usize) -> Option<CountedLoop> {
    let list = &method.insns;
    let at = |k: usize| ids.get(i + k).and_then(|&id| list.kind(id));

    let start = match at(0)? {
        InsnKind::Const(ConstValue::I32(v)) => *v,
        _ => return None,
    };
    let slot = match at(1)? {
        InsnKind::StoreLocal { slot, width: Width::I32 } => *slot,
        _ => return None,
    };
    let check_label = match at(2)? {
        InsnKind::Goto { target } => *target,
        _ => return None,
    };
    let body_label = match at(3)? {
        InsnKind::Label(label) => *label,
        _ => return None,
    };

    // Walk forward to the increment that closes the body
    let mut k = 4;
    let mut body = Vec::new();
    let step = loop {
        match at(k)? {
            InsnKind::IncrLocal { slot: s, delta } if *s == slot => break *delta,
            _ => {
                body.push(ids[i + k]);
                k += 1;
            }
        }
    };

    match at(k + 1)? {
        InsnKind::Label(label) if *label == check_label => {}
        _ => return None,
    }
    match at(k + 2)? {
        InsnKind::LoadLocal { slot: s, width: Width::I32 } if *s == slot => {}
        _ => return None,
    }
    let bound = match at(k + 3)? {
        InsnKind::Const(ConstValue::I32(v)) => *v,
        _ => return None,
    };
    let cond = match at(k + 4)? {
        InsnKind::Branch { cond, target } if *target == body_label => *cond,
        _ => return None,
    };
    if cond.as_sign_cond().is_none() {
        return None;
    }

    Some(CountedLoop {
        start_idx: i,
        end_idx: i + k + 4,
        body,
        slot,
        start,
        step,
        bound,
        cond,
    })
}

/// Strictness: nonzero stride, counter dead outside the region, body jumps
/// confined to body-internal labels, and region labels unreferenced from
/// outside.
fn loop_is_strict(method: &MethodBody, ids: &[InsnId], found: &CountedLoop) -> bool {
    if found.step == 0 {
        return false;
    }
    let region: FxHashSet<InsnId> = ids[found.start_idx..=found.end_idx].iter().copied().collect();
    let body: FxHashSet<InsnId> = found.body.iter().copied().collect();
    let body_labels: FxHashSet<LabelId> = found
        .body
        .iter()
        .filter_map(|&id| match method.insns.kind(id) {
            Some(InsnKind::Label(label)) => Some(*label),
            _ => None,
        })
        .collect();
    let region_labels: FxHashSet<LabelId> = region
        .iter()
        .filter_map(|&id| match method.insns.kind(id) {
            Some(InsnKind::Label(label)) => Some(*label),
            _ => None,
        })
        .collect();

    for (id, insn) in method.insns.iter() {
        let in_region = region.contains(&id);
        match &insn.kind {
            // The counter must not escape the loop region
            InsnKind::LoadLocal { slot, .. }
            | InsnKind::StoreLocal { slot, .. }
            | InsnKind::IncrLocal { slot, .. }
                if *slot == found.slot && !in_region =>
            {
                return false;
            }
            // The counter must not be written inside the body either
            InsnKind::StoreLocal { slot, .. } | InsnKind::IncrLocal { slot, .. }
                if *slot == found.slot && body.contains(&id) =>
            {
                return false;
            }
            _ => {}
        }
        if let Some(target) = insn.jump_target() {
            if body.contains(&id) && !body_labels.contains(&target) {
                return false;
            }
            if !in_region && region_labels.contains(&target) {
                return false;
            }
        }
    }
    true
}

/// Runs the counter to termination, returning the per-iteration values.
/// `None` when the loop exceeds the unroll fuse.
fn simulate(found: &CountedLoop, max_count: u32) -> Option<Vec<i32>> {
    let sign = found.cond.as_sign_cond()?;
    let mut values = Vec::new();
    let mut current = found.start;
    loop {
        let continues = sign.eval_sign(match current.cmp(&found.bound) {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        })?;
        if !continues {
            return Some(values);
        }
        if values.len() >= max_count as usize {
            return None;
        }
        values.push(current);
        current = current.checked_add(found.step)?;
    }
}

/// Replaces the loop region with one body copy per iteration value
fn unroll(method: &mut MethodBody, ids: &[InsnId], found: &CountedLoop, iterations: &[i32]) {
    let mut anchor = ids[found.end_idx];
    for &value in iterations {
        let mut session = CloneMap::new();
        let mut copy = method.insns.clone_range(&found.body, &mut session);
        for insn in &mut copy {
            if matches!(insn.kind, InsnKind::LoadLocal { slot, .. } if slot == found.slot) {
                *insn = Instruction::const_value(ConstValue::I32(value));
            }
        }
        copy.push(Instruction::nop());
        let inserted = method.insns.insert_slice_after(anchor, copy);
        if let Some(&last) = inserted.last() {
            anchor = last;
        }
    }
    for &id in &ids[found.start_idx..=found.end_idx] {
        method.insns.remove(id);
    }
}
