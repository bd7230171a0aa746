//! Array length inlining: rewrites `GetField; ArrayLength` over a
//! structurally final field, or `LoadLocal; ArrayLength` over an immutable
//! local array, into a single integer constant.

use crate::inspect::next_in_block;
use crate::passes::local_arrays::collect_local_arrays;
use crate::passes::{Pass, PassContext};
use crate::{ConstValue, Instruction, InsnKind, MethodBody, OptError};

#[derive(Debug, Default)]
pub struct FieldArrayLengthInline;

impl FieldArrayLengthInline {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for FieldArrayLengthInline {
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
            let Some(next) = next_in_block(&method.insns, id) else {
                continue;
            };
            if !matches!(method.insns.kind(next), Some(InsnKind::ArrayLength)) {
                continue;
            }
            let Some(field) = cx.class.field(&name) else {
                continue;
            };
            if !field.structurally_final {
                continue;
            }
            // A declared final field the source cannot resolve is a modeling
            // error, not a skippable site.
            let Some(value) = cx.values.resolve_field_value(&name) else {
                return Err(OptError::unresolvable(format!(
                    "no value for final field '{name}'"
                )));
            };
            let Some(len) = value.len() else {
                return Err(OptError::unresolvable(format!(
                    "final field '{name}' resolved to a non-array value"
                )));
            };
            let len = i32::try_from(len).map_err(|_| {
                OptError::unresolvable(format!("length of field '{name}' exceeds i32 range"))
            })?;
            method
                .insns
                .replace(next, Instruction::const_value(ConstValue::I32(len)));
            method.insns.remove(id);
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "FieldArrayLengthInline"
    }
}

#[derive(Debug, Default)]
pub struct LocalArrayLengthInline;

impl LocalArrayLengthInline {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for LocalArrayLengthInline {
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
            let Some(InsnKind::LoadLocal { slot, .. }) = method.insns.kind(id).cloned() else {
                continue;
            };
            let Some(next) = next_in_block(&method.insns, id) else {
                continue;
            };
            if !matches!(method.insns.kind(next), Some(InsnKind::ArrayLength)) {
                continue;
            }
            let Some(info) = arrays.get(&slot) else {
                continue;
            };
            if !info.immutable {
                continue;
            }
            let len = i32::try_from(info.len).map_err(|_| {
                OptError::unresolvable(format!("length of local array {slot} exceeds i32 range"))
            })?;
            method
                .insns
                .replace(next, Instruction::const_value(ConstValue::I32(len)));
            method.insns.remove(id);
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "LocalArrayLengthInline"
    }
}
