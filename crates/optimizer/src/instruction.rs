//! # Instructions
//!
//! This module defines the instruction sum type of the IR.
//!
//! # Design Notes
//!
//! - `InsnKind` is a closed tagged variant; passes match it exhaustively, so
//!   adding a kind is enforced at every match site by the type system
//! - Branch semantics: pop the operand(s), jump to the target label when the
//!   condition holds, otherwise fall through
//! - `Call` is only synthesized by the method splitter; its arguments travel
//!   through the named local slots of the helper, not the operand stack

use crate::{ConstValue, LabelId, PrettyPrint, Width};

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Condition of a conditional branch.
///
/// Single-operand kinds compare one popped value against zero (integers) or
/// null (references). Two-operand kinds pop and compare two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchCond {
    // One operand, against integer zero
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
    // One operand, against null
    Null,
    NonNull,
    // Two integer operands
    ICmpEq,
    ICmpNe,
    ICmpLt,
    ICmpGe,
    ICmpGt,
    ICmpLe,
    // Two reference operands, identity comparison
    RefEq,
    RefNe,
}

impl BranchCond {
    /// How many stack operands this branch pops
    pub const fn operand_count(self) -> usize {
        match self {
            Self::Eq
            | Self::Ne
            | Self::Lt
            | Self::Ge
            | Self::Gt
            | Self::Le
            | Self::Null
            | Self::NonNull => 1,
            Self::ICmpEq
            | Self::ICmpNe
            | Self::ICmpLt
            | Self::ICmpGe
            | Self::ICmpGt
            | Self::ICmpLe
            | Self::RefEq
            | Self::RefNe => 2,
        }
    }

    /// Returns true for the reference-typed kinds
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Null | Self::NonNull | Self::RefEq | Self::RefNe)
    }

    /// Evaluates a single-operand integer condition over the operand's
    /// ternary sign. Returns `None` for kinds that do not take one integer.
    pub const fn eval_sign(self, sign: i32) -> Option<bool> {
        match self {
            Self::Eq => Some(sign == 0),
            Self::Ne => Some(sign != 0),
            Self::Lt => Some(sign < 0),
            Self::Ge => Some(sign >= 0),
            Self::Gt => Some(sign > 0),
            Self::Le => Some(sign <= 0),
            _ => None,
        }
    }

    /// Evaluates a two-operand integer condition. Returns `None` for kinds
    /// that do not take two integers.
    pub const fn eval_icmp(self, left: i64, right: i64) -> Option<bool> {
        match self {
            Self::ICmpEq => Some(left == right),
            Self::ICmpNe => Some(left != right),
            Self::ICmpLt => Some(left < right),
            Self::ICmpGe => Some(left >= right),
            Self::ICmpGt => Some(left > right),
            Self::ICmpLe => Some(left <= right),
            _ => None,
        }
    }

    /// Maps a two-operand integer kind onto the equivalent single-operand
    /// kind over the sign of `left - right`. Used when un-winding a
    /// `Compare` result feeding a branch.
    pub const fn as_sign_cond(self) -> Option<Self> {
        match self {
            Self::ICmpEq => Some(Self::Eq),
            Self::ICmpNe => Some(Self::Ne),
            Self::ICmpLt => Some(Self::Lt),
            Self::ICmpGe => Some(Self::Ge),
            Self::ICmpGt => Some(Self::Gt),
            Self::ICmpLe => Some(Self::Le),
            _ => None,
        }
    }
}

/// An instruction performs one operation on the operand stack and locals.
///
/// Control flow is explicit: only `Branch`, `Goto`, and `Return` leave the
/// fall-through order, and they may only target a `Label` present in the
/// same list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsnKind {
    /// Push a constant
    Const(ConstValue),
    /// Push the value of a local slot
    LoadLocal { slot: u16, width: Width },
    /// Pop into a local slot
    StoreLocal { slot: u16, width: Width },
    /// Add a constant delta to an integer local slot in place
    IncrLocal { slot: u16, delta: i32 },
    /// Push the value of a class field
    GetField { name: String },
    /// Pop index and array reference, push the element
    ArrayLoad { width: Width },
    /// Pop value, index, and array reference, write the element
    ArrayStore { width: Width },
    /// Pop an array reference, push its length
    ArrayLength,
    /// Pop a length, push a fresh array reference
    NewArray { elem: Width },
    /// Pop two operands, push the result
    Binary { op: BinOp, width: Width },
    /// Pop two operands, push an ordering-encoding integer (-1, 0, or 1)
    Compare { width: Width },
    /// Pop operand(s), jump to `target` when the condition holds
    Branch { cond: BranchCond, target: LabelId },
    /// Unconditional jump
    Goto { target: LabelId },
    /// A position-independent jump anchor
    Label(LabelId),
    /// Numeric width conversion
    Cast { from: Width, to: Width },
    /// Invoke a synthesized helper method; arguments travel via local slots
    Call {
        method: String,
        returns: Option<Width>,
    },
    /// Split-point sentinel; never observable behavior
    Nop,
    /// Return from the method, popping the value if any
    Return { width: Option<Width> },
}

/// An instruction node: a kind plus an optional debugging comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InsnKind,
    /// Optional comment for debugging
    pub comment: Option<String>,
}

impl Instruction {
    pub const fn new(kind: InsnKind) -> Self {
        Self {
            kind,
            comment: None,
        }
    }

    /// Sets a comment for this instruction
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    // --- constructor helpers ---

    pub const fn const_value(value: ConstValue) -> Self {
        Self::new(InsnKind::Const(value))
    }

    pub const fn load_local(slot: u16, width: Width) -> Self {
        Self::new(InsnKind::LoadLocal { slot, width })
    }

    pub const fn store_local(slot: u16, width: Width) -> Self {
        Self::new(InsnKind::StoreLocal { slot, width })
    }

    pub const fn incr_local(slot: u16, delta: i32) -> Self {
        Self::new(InsnKind::IncrLocal { slot, delta })
    }

    pub fn get_field(name: impl Into<String>) -> Self {
        Self::new(InsnKind::GetField { name: name.into() })
    }

    pub const fn array_load(width: Width) -> Self {
        Self::new(InsnKind::ArrayLoad { width })
    }

    pub const fn array_store(width: Width) -> Self {
        Self::new(InsnKind::ArrayStore { width })
    }

    pub const fn array_length() -> Self {
        Self::new(InsnKind::ArrayLength)
    }

    pub const fn new_array(elem: Width) -> Self {
        Self::new(InsnKind::NewArray { elem })
    }

    pub const fn binary(op: BinOp, width: Width) -> Self {
        Self::new(InsnKind::Binary { op, width })
    }

    pub const fn compare(width: Width) -> Self {
        Self::new(InsnKind::Compare { width })
    }

    pub const fn branch(cond: BranchCond, target: LabelId) -> Self {
        Self::new(InsnKind::Branch { cond, target })
    }

    pub const fn goto(target: LabelId) -> Self {
        Self::new(InsnKind::Goto { target })
    }

    pub const fn label(id: LabelId) -> Self {
        Self::new(InsnKind::Label(id))
    }

    pub const fn cast(from: Width, to: Width) -> Self {
        Self::new(InsnKind::Cast { from, to })
    }

    pub fn call(method: impl Into<String>, returns: Option<Width>) -> Self {
        Self::new(InsnKind::Call {
            method: method.into(),
            returns,
        })
    }

    pub const fn nop() -> Self {
        Self::new(InsnKind::Nop)
    }

    pub const fn ret(width: Option<Width>) -> Self {
        Self::new(InsnKind::Return { width })
    }

    /// The jump target if this is a `Branch` or `Goto`
    pub const fn jump_target(&self) -> Option<LabelId> {
        match &self.kind {
            InsnKind::Branch { target, .. } | InsnKind::Goto { target } => Some(*target),
            _ => None,
        }
    }

    /// Net operand-stack effect as `(pops, pushes)`
    pub fn stack_effect(&self) -> (usize, usize) {
        match &self.kind {
            InsnKind::Const(_) | InsnKind::LoadLocal { .. } | InsnKind::GetField { .. } => (0, 1),
            InsnKind::StoreLocal { .. } => (1, 0),
            InsnKind::IncrLocal { .. }
            | InsnKind::Goto { .. }
            | InsnKind::Label(_)
            | InsnKind::Nop => (0, 0),
            InsnKind::ArrayLoad { .. } => (2, 1),
            InsnKind::ArrayStore { .. } => (3, 0),
            InsnKind::ArrayLength | InsnKind::NewArray { .. } | InsnKind::Cast { .. } => (1, 1),
            InsnKind::Binary { .. } | InsnKind::Compare { .. } => (2, 1),
            InsnKind::Branch { cond, .. } => (cond.operand_count(), 0),
            InsnKind::Call { returns, .. } => (0, usize::from(returns.is_some())),
            InsnKind::Return { width } => (usize::from(width.is_some()), 0),
        }
    }

    /// Encoded byte-size cost used by the method splitter
    pub fn encoded_size(&self) -> usize {
        match &self.kind {
            InsnKind::Const(ConstValue::Null) => 1,
            InsnKind::Const(_) => 3,
            InsnKind::LoadLocal { .. } | InsnKind::StoreLocal { .. } => 2,
            InsnKind::IncrLocal { .. } => 3,
            InsnKind::GetField { .. } => 3,
            InsnKind::ArrayLoad { .. }
            | InsnKind::ArrayStore { .. }
            | InsnKind::ArrayLength
            | InsnKind::Binary { .. }
            | InsnKind::Compare { .. }
            | InsnKind::Cast { .. }
            | InsnKind::Return { .. } => 1,
            InsnKind::NewArray { .. } => 2,
            InsnKind::Branch { .. } | InsnKind::Goto { .. } | InsnKind::Call { .. } => 3,
            InsnKind::Label(_) => 0,
            InsnKind::Nop => 1,
        }
    }

    /// Returns true if this instruction can transfer control away from the
    /// fall-through order
    pub const fn is_control_flow(&self) -> bool {
        matches!(
            self.kind,
            InsnKind::Branch { .. } | InsnKind::Goto { .. } | InsnKind::Return { .. }
        )
    }
}

impl PrettyPrint for Instruction {
    fn pretty_print(&self, _indent: usize) -> String {
        let body = match &self.kind {
            InsnKind::Const(value) => format!("const {value}"),
            InsnKind::LoadLocal { slot, width } => format!("load.{width:?} ${slot}"),
            InsnKind::StoreLocal { slot, width } => format!("store.{width:?} ${slot}"),
            InsnKind::IncrLocal { slot, delta } => format!("incr ${slot}, {delta}"),
            InsnKind::GetField { name } => format!("getfield {name}"),
            InsnKind::ArrayLoad { width } => format!("aload.{width:?}"),
            InsnKind::ArrayStore { width } => format!("astore.{width:?}"),
            InsnKind::ArrayLength => "arraylength".to_string(),
            InsnKind::NewArray { elem } => format!("newarray.{elem:?}"),
            InsnKind::Binary { op, width } => format!("{op:?}.{width:?}").to_lowercase(),
            InsnKind::Compare { width } => format!("cmp.{width:?}"),
            InsnKind::Branch { cond, target } => format!("if.{cond:?} -> L{}", target.index()),
            InsnKind::Goto { target } => format!("goto L{}", target.index()),
            InsnKind::Label(id) => format!("L{}:", id.index()),
            InsnKind::Cast { from, to } => format!("cast.{from:?}->{to:?}"),
            InsnKind::Call { method, .. } => format!("call {method}"),
            InsnKind::Nop => "nop".to_string(),
            InsnKind::Return { width: Some(w) } => format!("return.{w:?}"),
            InsnKind::Return { width: None } => "return".to_string(),
        };
        match &self.comment {
            Some(comment) => format!("{body}  // {comment}"),
            None => body,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_print(0))
    }
}
