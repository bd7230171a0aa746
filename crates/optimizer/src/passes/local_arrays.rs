//! Shared analysis for the local array inliners: recognizes straight-line
//! array creation/initialization patterns and decides whether a slot's array
//! is immutable for the rest of the method.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ConstValue, InsnId, InsnKind, MethodBody, Width};

/// A local slot holding an array created and initialized in straight-line
/// code at the top of its live range.
#[derive(Debug, Clone)]
pub struct LocalArrayInfo {
    pub slot: u16,
    pub len: usize,
    pub elem_width: Width,
    /// Element constants from the initializer; unwritten indices keep the
    /// zero default
    pub elems: Vec<ConstValue>,
    /// The slot is stored exactly once and no element store follows the
    /// initializer region
    pub immutable: bool,
}

/// Scans a method for the creation pattern
/// `Const(len); NewArray; StoreLocal` followed by zero or more
/// `LoadLocal; Const(idx); Const(v); ArrayStore` initializer groups.
///
/// Labels anywhere in the pattern break it: a jump target inside the window
/// means the straight-line reading is unsound.
pub fn collect_local_arrays(method: &MethodBody) -> FxHashMap<u16, LocalArrayInfo> {
    let mut found: FxHashMap<u16, LocalArrayInfo> = FxHashMap::default();
    // The one StoreLocal and the ArrayStores each recognized region owns
    let mut own_store: FxHashMap<u16, InsnId> = FxHashMap::default();
    let mut region_stores: FxHashSet<InsnId> = FxHashSet::default();
    let ids = method.insns.ids();

    let mut i = 0;
    while i < ids.len() {
        if let Some((info, region, consumed)) = match_creation(method, &ids, i) {
            own_store.insert(info.slot, region.store);
            region_stores.extend(region.element_stores);
            found.insert(info.slot, info);
            i += consumed;
        } else {
            i += 1;
        }
    }

    // Demote any array whose slot is written again, and demote everything on
    // an element store we cannot attribute to a recognized initializer.
    for (id, insn) in method.insns.iter() {
        match &insn.kind {
            InsnKind::StoreLocal { slot, .. } | InsnKind::IncrLocal { slot, .. } => {
                if let Some(info) = found.get_mut(slot) {
                    if own_store.get(slot) != Some(&id) {
                        info.immutable = false;
                    }
                }
            }
            InsnKind::ArrayStore { .. } if !region_stores.contains(&id) => {
                for info in found.values_mut() {
                    info.immutable = false;
                }
            }
            _ => {}
        }
    }

    found
}

/// The instructions a recognized creation pattern owns
struct CreationRegion {
    store: InsnId,
    element_stores: Vec<InsnId>,
}

/// Matches the creation pattern starting at `ids[i]`, then greedily consumes
/// initializer groups. Returns the info, the owned instructions, and how
/// many positions were consumed.
fn match_creation(
    method: &MethodBody,
    ids: &[InsnId],
    i: usize,
) -> Option<(LocalArrayInfo, CreationRegion, usize)> {
    let list = &method.insns;
    let len = match list.kind(ids[i])? {
        InsnKind::Const(ConstValue::I32(n)) if *n >= 0 => *n as usize,
        _ => return None,
    };
    let elem = match list.kind(*ids.get(i + 1)?)? {
        InsnKind::NewArray { elem } => *elem,
        _ => return None,
    };
    let slot = match list.kind(*ids.get(i + 2)?)? {
        InsnKind::StoreLocal { slot, width: Width::Ref } => *slot,
        _ => return None,
    };

    let zero = zero_of(elem)?;
    let mut elems = vec![zero; len];
    let mut region = CreationRegion {
        store: ids[i + 2],
        element_stores: Vec::new(),
    };
    let mut consumed = 3;

    // Initializer groups: LoadLocal slot; Const idx; Const v; ArrayStore
    while let (Some(&a), Some(&b), Some(&c), Some(&d)) = (
        ids.get(i + consumed),
        ids.get(i + consumed + 1),
        ids.get(i + consumed + 2),
        ids.get(i + consumed + 3),
    ) {
        let group = (list.kind(a), list.kind(b), list.kind(c), list.kind(d));
        let (
            Some(InsnKind::LoadLocal { slot: s, width: Width::Ref }),
            Some(InsnKind::Const(idx)),
            Some(InsnKind::Const(value)),
            Some(InsnKind::ArrayStore { width }),
        ) = group
        else {
            break;
        };
        if *s != slot || *width != elem || value.width() != elem {
            break;
        }
        let Some(idx) = idx.as_index() else { break };
        let Ok(idx) = usize::try_from(idx) else { break };
        if idx >= len {
            break;
        }
        elems[idx] = value.clone();
        region.element_stores.push(d);
        consumed += 4;
    }

    Some((
        LocalArrayInfo {
            slot,
            len,
            elem_width: elem,
            elems,
            immutable: true,
        },
        region,
        consumed,
    ))
}

/// The default element value of a freshly allocated array
fn zero_of(width: Width) -> Option<ConstValue> {
    match width {
        Width::I32 => Some(ConstValue::I32(0)),
        Width::I64 => Some(ConstValue::I64(0)),
        Width::F32 => Some(ConstValue::F32(0.0)),
        Width::F64 => Some(ConstValue::F64(0.0)),
        Width::Ref => Some(ConstValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Instruction;

    fn array_method(extra: Vec<Instruction>) -> MethodBody {
        let mut insns = vec![
            Instruction::const_value(ConstValue::I32(3)),
            Instruction::new_array(Width::I32),
            Instruction::store_local(0, Width::Ref),
            Instruction::load_local(0, Width::Ref),
            Instruction::const_value(ConstValue::I32(0)),
            Instruction::const_value(ConstValue::I32(10)),
            Instruction::array_store(Width::I32),
            Instruction::load_local(0, Width::Ref),
            Instruction::const_value(ConstValue::I32(2)),
            Instruction::const_value(ConstValue::I32(30)),
            Instruction::array_store(Width::I32),
        ];
        insns.extend(extra);
        insns.push(Instruction::ret(None));
        let mut method = MethodBody::new("f", None, 1).optimizable();
        method.insns = insns.into_iter().collect();
        method
    }

    #[test]
    fn recognizes_creation_and_initializer() {
        let method = array_method(vec![]);
        let arrays = collect_local_arrays(&method);
        let info = arrays.get(&0).expect("array not found");
        assert_eq!(info.len, 3);
        assert!(info.immutable);
        assert_eq!(
            info.elems,
            vec![ConstValue::I32(10), ConstValue::I32(0), ConstValue::I32(30)]
        );
    }

    #[test]
    fn later_element_store_demotes_immutability() {
        let method = array_method(vec![
            Instruction::load_local(0, Width::Ref),
            Instruction::const_value(ConstValue::I32(1)),
            Instruction::const_value(ConstValue::I32(99)),
            Instruction::array_store(Width::I32),
        ]);
        // The trailing group parses as part of the initializer only if it is
        // adjacent; insert a barrier to force it out of the region.
        let mut method = method;
        let ids = method.insns.ids();
        method.insns.insert_after(ids[10], Instruction::nop());
        let arrays = collect_local_arrays(&method);
        assert!(!arrays.get(&0).expect("array not found").immutable);
    }

    #[test]
    fn restore_of_slot_demotes_immutability() {
        let method = array_method(vec![
            Instruction::const_value(ConstValue::I32(5)),
            Instruction::new_array(Width::I32),
            Instruction::store_local(0, Width::Ref),
        ]);
        let arrays = collect_local_arrays(&method);
        assert!(!arrays.get(&0).expect("array not found").immutable);
    }

    #[test]
    fn negative_length_is_not_a_pattern() {
        let mut method = MethodBody::new("f", None, 1).optimizable();
        method.insns = vec![
            Instruction::const_value(ConstValue::I32(-1)),
            Instruction::new_array(Width::I32),
            Instruction::store_local(0, Width::Ref),
            Instruction::ret(None),
        ]
        .into_iter()
        .collect();
        assert!(collect_local_arrays(&method).is_empty());
    }

    #[test]
    fn out_of_bounds_initializer_index_ends_the_region() {
        let method = array_method(vec![
            Instruction::load_local(0, Width::Ref),
            Instruction::const_value(ConstValue::I32(7)),
            Instruction::const_value(ConstValue::I32(1)),
            Instruction::array_store(Width::I32),
        ]);
        let arrays = collect_local_arrays(&method);
        // The out-of-bounds group falls outside the region, so it counts as
        // a later element store.
        assert!(!arrays.get(&0).expect("array not found").immutable);
    }
}
