//! Arithmetic folding: rewrites `Const, Const, Binary` windows into a single
//! `Const` carrying the result, computed in the operation's declared width.

use crate::inspect::{const_ending_at, prev_in_block};
use crate::passes::{Pass, PassContext};
use crate::{BinOp, ConstValue, Instruction, InsnKind, MethodBody, OptError};

#[derive(Debug, Default)]
pub struct ArithmeticFold;

impl ArithmeticFold {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for ArithmeticFold {
    fn run(
        &mut self,
        method: &mut MethodBody,
        _cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        let mut changed = false;
        for id in method.insns.ids() {
            let Some(InsnKind::Binary { op, width }) = method.insns.kind(id).cloned() else {
                continue;
            };
            let Some(right_end) = prev_in_block(&method.insns, id) else {
                continue;
            };
            let Some(right) = const_ending_at(&method.insns, right_end) else {
                continue;
            };
            let Some(left_end) = prev_in_block(&method.insns, right.first()) else {
                continue;
            };
            let Some(left) = const_ending_at(&method.insns, left_end) else {
                continue;
            };
            if left.value.width() != width || right.value.width() != width {
                continue;
            }
            let Some(result) = eval(op, &left.value, &right.value) else {
                continue;
            };
            method.insns.replace(id, Instruction::const_value(result));
            for window_id in left.insns.iter().chain(right.insns.iter()) {
                method.insns.remove(*window_id);
            }
            changed = true;
        }
        Ok(changed)
    }

    fn name(&self) -> &'static str {
        "ArithmeticFold"
    }
}

/// Evaluates one binary operation over matching-width constants.
///
/// Integer arithmetic wraps on overflow; integer division or remainder by
/// zero is left unfolded so the runtime fault survives. Float arithmetic
/// follows IEEE semantics, including NaN and infinity propagation.
fn eval(op: BinOp, left: &ConstValue, right: &ConstValue) -> Option<ConstValue> {
    let out = match (left, right) {
        (ConstValue::I32(a), ConstValue::I32(b)) => ConstValue::I32(eval_i32(op, *a, *b)?),
        (ConstValue::I64(a), ConstValue::I64(b)) => ConstValue::I64(eval_i64(op, *a, *b)?),
        (ConstValue::F32(a), ConstValue::F32(b)) => ConstValue::F32(eval_float(op, *a, *b)),
        (ConstValue::F64(a), ConstValue::F64(b)) => ConstValue::F64(eval_float(op, *a, *b)),
        _ => return None,
    };
    Some(out)
}

fn eval_i32(op: BinOp, a: i32, b: i32) -> Option<i32> {
    match op {
        BinOp::Add => Some(a.wrapping_add(b)),
        BinOp::Sub => Some(a.wrapping_sub(b)),
        BinOp::Mul => Some(a.wrapping_mul(b)),
        BinOp::Div if b != 0 => Some(a.wrapping_div(b)),
        BinOp::Rem if b != 0 => Some(a.wrapping_rem(b)),
        BinOp::Div | BinOp::Rem => None,
    }
}

fn eval_i64(op: BinOp, a: i64, b: i64) -> Option<i64> {
    match op {
        BinOp::Add => Some(a.wrapping_add(b)),
        BinOp::Sub => Some(a.wrapping_sub(b)),
        BinOp::Mul => Some(a.wrapping_mul(b)),
        BinOp::Div if b != 0 => Some(a.wrapping_div(b)),
        BinOp::Rem if b != 0 => Some(a.wrapping_rem(b)),
        BinOp::Div | BinOp::Rem => None,
    }
}

fn eval_float<F>(op: BinOp, a: F, b: F) -> F
where
    F: std::ops::Add<Output = F>
        + std::ops::Sub<Output = F>
        + std::ops::Mul<Output = F>
        + std::ops::Div<Output = F>
        + std::ops::Rem<Output = F>,
{
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Rem => a % b,
    }
}
