//! # Values and Widths
//!
//! This module defines the numeric widths instructions operate at, the
//! compile-time constants that flow through the instruction list, and the
//! runtime values surfaced by the external field-value collaborator.

use crate::PrettyPrint;

/// The operand width of an instruction.
///
/// Every arithmetic, comparison, cast, and array-access instruction carries
/// one of these; evaluation semantics are width-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Object/array reference
    Ref,
}

impl Width {
    /// Returns true for the four numeric widths (everything but `Ref`)
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Ref)
    }

    /// Returns true for the two integer widths
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    /// Returns true for the two float widths
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// A compile-time constant carried by a `Const` instruction.
///
/// Floats compare bit-exactly so that optimized instruction sequences can be
/// compared structurally (idempotence checks rely on this).
#[derive(Debug, Clone)]
pub enum ConstValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// The null reference
    Null,
    /// A string reference constant
    Str(String),
}

impl ConstValue {
    /// The width this constant pushes at
    pub const fn width(&self) -> Width {
        match self {
            Self::I32(_) => Width::I32,
            Self::I64(_) => Width::I64,
            Self::F32(_) => Width::F32,
            Self::F64(_) => Width::F64,
            Self::Null | Self::Str(_) => Width::Ref,
        }
    }

    /// Returns the value widened to `i64` if this is an integer constant
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::I32(v) => Some(*v as i64),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `f64` if this is a float constant
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `i32` array index if it is one
    pub const fn as_index(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns true if this is the null reference
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The ternary sign of an integer constant, used by branch evaluation
    pub fn sign(&self) -> Option<i32> {
        self.as_int().map(|v| match v {
            0 => 0,
            v if v < 0 => -1,
            _ => 1,
        })
    }
}

impl PartialEq for ConstValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            // Bit-exact so folded output compares deterministically
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Null, Self::Null) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ConstValue {}

impl std::hash::Hash for ConstValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::I32(v) => v.hash(state),
            Self::I64(v) => v.hash(state),
            Self::F32(v) => v.to_bits().hash(state),
            Self::F64(v) => v.to_bits().hash(state),
            Self::Null => {}
            Self::Str(v) => v.hash(state),
        }
    }
}

impl PrettyPrint for ConstValue {
    fn pretty_print(&self, _indent: usize) -> String {
        match self {
            Self::I32(v) => format!("{v}i32"),
            Self::I64(v) => format!("{v}i64"),
            Self::F32(v) => format!("{v}f32"),
            Self::F64(v) => format!("{v}f64"),
            Self::Null => "null".to_string(),
            Self::Str(v) => format!("{v:?}"),
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_print(0))
    }
}

impl From<i32> for ConstValue {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

/// A value read from the running program by the external collaborator.
///
/// Field-scoped inliners resolve array lengths and element values through
/// these; nested arrays model multi-dimensional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Null,
    Array(Vec<RuntimeValue>),
}

impl RuntimeValue {
    /// Array length if this is an array
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Array(elems) => Some(elems.len()),
            _ => None,
        }
    }

    /// Indexes into an array value
    pub fn index(&self, idx: i32) -> Option<&Self> {
        match self {
            Self::Array(elems) => usize::try_from(idx).ok().and_then(|i| elems.get(i)),
            _ => None,
        }
    }

    /// Converts to a foldable constant of the requested primitive width
    pub fn as_const(&self, width: Width) -> Option<ConstValue> {
        match (self, width) {
            (Self::I32(v), Width::I32) => Some(ConstValue::I32(*v)),
            (Self::I64(v), Width::I64) => Some(ConstValue::I64(*v)),
            (Self::F32(v), Width::F32) => Some(ConstValue::F32(*v)),
            (Self::F64(v), Width::F64) => Some(ConstValue::F64(*v)),
            _ => None,
        }
    }

    /// Returns true if this is the null reference
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}
