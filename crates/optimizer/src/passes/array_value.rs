//! Array value inlining: folds constant-index element reads out of
//! immutable-content field arrays (including nested access chains) and out
//! of immutable local arrays.
//!
//! A chain that bottoms out in a non-null sub-array cannot fold to a
//! constant; instead it is recorded as a non-null fact for the branch
//! eliminator to consume within the same round.

use smallvec::SmallVec;

use crate::inspect::next_in_block;
use crate::passes::local_arrays::collect_local_arrays;
use crate::passes::{NonNullArrayValue, Pass, PassContext};
use crate::{
    ConstValue, InsnId, InsnKind, Instruction, MethodBody, OptError, RuntimeValue, Width,
};

/// Deepest supported access chain, in `ArrayLoad` steps
const MAX_CHAIN_DEPTH: usize = 8;

#[derive(Debug, Default)]
pub struct FieldArrayValueInline;

impl FieldArrayValueInline {
    pub fn new() -> Self {
        Self
    }
}

/// One matched access chain: the instruction ids it spans and the indices it
/// applies, outermost first.
struct AccessChain {
    insns: SmallVec<[InsnId; 4]>,
    indices: SmallVec<[i32; 4]>,
    last_width: Width,
}

impl Pass for FieldArrayValueInline {
    fn run(
        &mut self,
        method: &mut MethodBody,
        cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        let mut changed = false;
        for id in method.insns.ids() {
            let Some(InsnKind::GetField { name }) = method.insns.kind(id).cloned() else {
                continue;
            };
            let Some(field) = cx.class.field(&name) else {
                continue;
            };
            let strict = field.immutable_contents
                || method.markers.strict_fields.iter().any(|f| f == &name);
            if !strict {
                continue;
            }
            let Some(chain) = match_chain(method, id)? else {
                continue;
            };
            let Some(root) = cx.values.resolve_field_value(&name) else {
                return Err(OptError::unresolvable(format!(
                    "no value for immutable field '{name}'"
                )));
            };

            let mut value = &root;
            let mut in_bounds = true;
            for &idx in &chain.indices {
                match value.index(idx) {
                    Some(element) => value = element,
                    None => {
                        // Out-of-bounds access faults at runtime; leave the
                        // chain for the interpreter to trap on.
                        in_bounds = false;
                        break;
                    }
                }
            }
            if !in_bounds {
                continue;
            }

            if chain.last_width == Width::Ref {
                if value.is_null() {
                    collapse_chain(method, &chain, ConstValue::Null);
                    changed = true;
                } else if matches!(value, RuntimeValue::Array(_)) {
                    cx.facts.record(NonNullArrayValue {
                        chain: chain.insns.clone(),
                    });
                } else {
                    return Err(OptError::unresolvable(format!(
                        "reference read of field '{name}' resolved to a primitive"
                    )));
                }
            } else {
                let Some(constant) = value.as_const(chain.last_width) else {
                    return Err(OptError::unresolvable(format!(
                        "element of field '{name}' does not fit width {:?}",
                        chain.last_width
                    )));
                };
                collapse_chain(method, &chain, constant);
                changed = true;
            }
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "FieldArrayValueInline"
    }
}

/// Matches `GetField` followed by one or more `Const(idx); ArrayLoad` steps
fn match_chain(method: &MethodBody, field_id: InsnId) -> Result<Option<AccessChain>, OptError> {
    let list = &method.insns;
    let mut insns: SmallVec<[InsnId; 4]> = SmallVec::new();
    let mut indices: SmallVec<[i32; 4]> = SmallVec::new();
    insns.push(field_id);

    let mut cursor = field_id;
    let mut last_width = None;
    loop {
        let Some(idx_id) = next_in_block(list, cursor) else {
            break;
        };
        let Some(InsnKind::Const(idx)) = list.kind(idx_id) else {
            break;
        };
        let Some(idx) = idx.as_index() else {
            break;
        };
        let Some(load_id) = next_in_block(list, idx_id) else {
            break;
        };
        let Some(InsnKind::ArrayLoad { width }) = list.kind(load_id) else {
            break;
        };
        insns.push(idx_id);
        insns.push(load_id);
        indices.push(idx);
        last_width = Some(*width);
        cursor = load_id;
        if indices.len() > MAX_CHAIN_DEPTH {
            return Err(OptError::unsupported(format!(
                "field access chain deeper than {MAX_CHAIN_DEPTH}"
            )));
        }
    }

    Ok(last_width.map(|last_width| AccessChain {
        insns,
        indices,
        last_width,
    }))
}

/// Replaces the chain's last instruction with the constant and removes the
/// rest
fn collapse_chain(method: &mut MethodBody, chain: &AccessChain, constant: ConstValue) {
    let last = chain.insns[chain.insns.len() - 1];
    method.insns.replace(last, Instruction::const_value(constant));
    for &id in &chain.insns[..chain.insns.len() - 1] {
        method.insns.remove(id);
    }
}

#[derive(Debug, Default)]
pub struct LocalArrayValueInline;

impl LocalArrayValueInline {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for LocalArrayValueInline {
    fn run(
        &mut self,
        method: &mut MethodBody,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        let arrays = collect_local_arrays(method);
        if arrays.is_empty() {
            return Ok(false);
        }
        let mut changed = false;
        for id in method.insns.ids() {
            let Some(InsnKind::LoadLocal { slot, width: Width::Ref }) =
                method.insns.kind(id).cloned()
            else {
                continue;
            };
            let Some(info) = arrays.get(&slot) else {
                continue;
            };
            if !info.immutable {
                continue;
            }
            let Some(idx_id) = next_in_block(&method.insns, id) else {
                continue;
            };
            let Some(InsnKind::Const(idx)) = method.insns.kind(idx_id) else {
                continue;
            };
            let Some(idx) = idx.as_index() else {
                continue;
            };
            let Some(load_id) = next_in_block(&method.insns, idx_id) else {
                continue;
            };
            let Some(InsnKind::ArrayLoad { width }) = method.insns.kind(load_id) else {
                continue;
            };
            if *width != info.elem_width {
                continue;
            }
            let Ok(idx) = usize::try_from(idx) else {
                continue;
            };
            // Out of bounds faults at runtime; leave the access alone
            let Some(element) = info.elems.get(idx).cloned() else {
                continue;
            };
            method
                .insns
                .replace(load_id, Instruction::const_value(element));
            method.insns.remove(idx_id);
            method.insns.remove(id);
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "LocalArrayValueInline"
    }
}
