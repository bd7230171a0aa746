//! # Method Splitter
//!
//! Splits an oversized method body into a chain of helper methods, each
//! within the encoded-size bound. Split points are chosen where the operand
//! stack is empty and no branch span is crossed, so every helper is a
//! self-contained tail: the parent ends by calling the next helper and
//! returning its result, and control never comes back.
//!
//! Unrolled-loop sentinels double as preferred split points; all sentinels
//! are stripped from the final bodies.

use rustc_hash::FxHashMap;

use crate::{
    predicates, Instruction, InsnId, InsnKind, MethodBody, MethodMarkers, OptError,
    OptimizeConfig, Width,
};

/// Encoded size of the `Call; Return` epilogue a non-final segment carries
const CHAIN_OVERHEAD: usize = 4;

pub struct MethodSplitter<'a> {
    config: &'a OptimizeConfig,
}

impl<'a> MethodSplitter<'a> {
    pub fn new(config: &'a OptimizeConfig) -> Self {
        Self { config }
    }

    /// Splits `method` if it exceeds the size bound.
    ///
    /// Returns the (possibly rewritten) method and the helper bodies, in
    /// call order. A method already within bounds comes back unchanged
    /// apart from sentinel stripping.
    pub fn split(&self, mut method: MethodBody) -> Result<(MethodBody, Vec<MethodBody>), OptError> {
        strip_sentinels(&mut method);
        let limit = self.config.max_method_size;
        if method.insns.total_encoded_size() <= limit {
            return Ok((method, Vec::new()));
        }

        let insns: Vec<(InsnId, Instruction)> = method
            .insns
            .iter()
            .map(|(id, insn)| (id, insn.clone()))
            .collect();
        for (_, insn) in &insns {
            if insn.encoded_size() > limit {
                return Err(OptError::size_constraint(format!(
                    "single instruction of size {} exceeds bound {limit}",
                    insn.encoded_size()
                )));
            }
        }

        let depths = stack_depths(&insns)?;
        let forbidden = forbidden_boundaries(&method, &insns);
        let segments = plan_segments(&insns, &depths, &forbidden, limit)?;
        debug_assert!(segments.len() > 1);

        let local_widths = local_width_table(&method, &insns);
        let mut helpers = Vec::with_capacity(segments.len() - 1);
        for (k, segment) in segments.iter().enumerate().skip(1) {
            // Conservative parameter set: every slot the rest of the chain
            // still reads
            let remainder_start = segment.start;
            let params = read_slots(&insns[remainder_start..], &local_widths);
            let mut helper = MethodBody::new(method.helper_name(k), method.ret, method.max_locals)
                .with_params(params)
                .with_markers(MethodMarkers::default());
            helper.insns = insns[segment.clone()]
                .iter()
                .map(|(_, insn)| insn.clone())
                .collect();
            helpers.push(helper);
        }

        // Thread the chain: every non-final body ends by tail-calling the
        // next helper and returning its result.
        let ret = method.ret;
        for k in 0..helpers.len() - 1 {
            let callee = helpers[k + 1].name.clone();
            append_chain_call(&mut helpers[k], callee, ret);
        }
        let first_helper = helpers[0].name.clone();
        method.insns = insns[segments[0].clone()]
            .iter()
            .map(|(_, insn)| insn.clone())
            .collect();
        append_chain_call(&mut method, first_helper, ret);

        for helper in &helpers {
            debug_assert!(helper.insns.total_encoded_size() <= limit);
        }
        Ok((method, helpers))
    }
}

fn strip_sentinels(method: &mut MethodBody) {
    for id in method.insns.ids() {
        if method.insns.kind(id).is_some_and(predicates::is_split_marker) {
            method.insns.remove(id);
        }
    }
}

fn append_chain_call(body: &mut MethodBody, callee: String, ret: Option<Width>) {
    body.insns.push_back(Instruction::call(callee, ret));
    body.insns.push_back(Instruction::ret(ret));
}

/// Operand-stack depth before each instruction, by linear simulation.
/// Control flow only joins at empty-stack points in this IR, so the linear
/// reading is exact; an underflow means the list is malformed.
fn stack_depths(insns: &[(InsnId, Instruction)]) -> Result<Vec<usize>, OptError> {
    let mut depths = Vec::with_capacity(insns.len());
    let mut depth = 0usize;
    for (_, insn) in insns {
        depths.push(depth);
        let (pops, pushes) = insn.stack_effect();
        depth = depth
            .checked_sub(pops)
            .ok_or_else(|| OptError::malformed("operand stack underflow"))?
            + pushes;
    }
    Ok(depths)
}

/// Boundary `i` (a split before instruction `i`) is forbidden when any
/// branch span crosses it
fn forbidden_boundaries(method: &MethodBody, insns: &[(InsnId, Instruction)]) -> Vec<bool> {
    let position: FxHashMap<InsnId, usize> = insns
        .iter()
        .enumerate()
        .map(|(idx, (id, _))| (*id, idx))
        .collect();
    let mut forbidden = vec![false; insns.len() + 1];
    for (idx, (_, insn)) in insns.iter().enumerate() {
        let Some(target) = insn.jump_target() else {
            continue;
        };
        let Some(label_idx) = method
            .insns
            .label_position(target)
            .and_then(|id| position.get(&id).copied())
        else {
            continue;
        };
        let (lo, hi) = (idx.min(label_idx), idx.max(label_idx));
        for boundary in forbidden.iter_mut().take(hi + 1).skip(lo + 1) {
            *boundary = true;
        }
    }
    forbidden
}

/// Greedy segmentation: accumulate until the next instruction would
/// overflow the per-segment budget, then close at the most recent safe
/// boundary.
fn plan_segments(
    insns: &[(InsnId, Instruction)],
    depths: &[usize],
    forbidden: &[bool],
    limit: usize,
) -> Result<Vec<std::ops::Range<usize>>, OptError> {
    let budget = limit.saturating_sub(CHAIN_OVERHEAD);
    let mut segments = Vec::new();
    let mut start = 0usize;
    let mut size = 0usize;
    let mut last_safe: Option<usize> = None;

    for (idx, (_, insn)) in insns.iter().enumerate() {
        if idx > start && depths[idx] == 0 && !forbidden[idx] {
            last_safe = Some(idx);
        }
        let cost = insn.encoded_size();
        while size + cost > budget {
            let cut = last_safe.ok_or_else(|| {
                OptError::size_constraint(format!(
                    "no safe split point within budget {budget}"
                ))
            })?;
            segments.push(start..cut);
            start = cut;
            size = insns[cut..idx].iter().map(|(_, i)| i.encoded_size()).sum();
            last_safe = ((cut + 1)..idx)
                .rev()
                .find(|&b| depths[b] == 0 && !forbidden[b]);
        }
        size += cost;
    }
    segments.push(start..insns.len());
    Ok(segments)
}

/// Slot widths observed across the whole method, seeded by the declared
/// parameters
fn local_width_table(
    method: &MethodBody,
    insns: &[(InsnId, Instruction)],
) -> FxHashMap<u16, Width> {
    let mut widths: FxHashMap<u16, Width> = method.params.iter().copied().collect();
    for (_, insn) in insns {
        match &insn.kind {
            InsnKind::LoadLocal { slot, width } | InsnKind::StoreLocal { slot, width } => {
                widths.entry(*slot).or_insert(*width);
            }
            InsnKind::IncrLocal { slot, .. } => {
                widths.entry(*slot).or_insert(Width::I32);
            }
            _ => {}
        }
    }
    widths
}

/// The slots the instruction suffix reads, sorted for a stable signature
fn read_slots(
    suffix: &[(InsnId, Instruction)],
    widths: &FxHashMap<u16, Width>,
) -> Vec<(u16, Width)> {
    let mut slots: Vec<u16> = suffix
        .iter()
        .filter_map(|(_, insn)| match &insn.kind {
            InsnKind::LoadLocal { slot, .. } | InsnKind::IncrLocal { slot, .. } => Some(*slot),
            _ => None,
        })
        .collect();
    slots.sort_unstable();
    slots.dedup();
    slots
        .into_iter()
        .map(|slot| (slot, widths.get(&slot).copied().unwrap_or(Width::I32)))
        .collect()
}
