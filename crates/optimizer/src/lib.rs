//! # Bytefold Optimizer
//!
//! This crate implements an instruction-level optimization pipeline for
//! compiled method bodies, together with a size-bounded method splitter.
//!
//! ## Design Principles
//!
//! 1. **Flat instruction list IR**: a method body is an ordered, mutable
//!    sequence of instructions backed by an arena with stable handles
//! 2. **Closed instruction sum type**: every pass matches `InsnKind`
//!    exhaustively; adding an instruction kind is a compile-time event
//! 3. **Stateless passes at a fixed point**: each pass reports whether it
//!    changed anything and the driver re-runs the whole list until a full
//!    round makes no change
//! 4. **Best-effort per method**: any structural error abandons optimization
//!    of the current method and surfaces its original body unchanged
//!
//! ## Architecture
//!
//! ```text
//! ClassModel
//!   fields: FieldDecl (structurally final / immutable contents)
//!   methods: MethodBody
//!
//! MethodBody
//!   insns: InsnList (arena of Instruction, doubly linked)
//!   markers: MethodMarkers (optimizable, strict loops, extra passes)
//!
//! optimize() = PassManager::run to fixed point, then MethodSplitter once
//! ```

pub use class::{ClassModel, FieldDecl, FieldValueSource, MapValueSource};
pub use clone_map::CloneMap;
pub use error::OptError;
pub use instruction::{BinOp, BranchCond, InsnKind, Instruction};
pub use list::InsnList;
pub use method::{MethodBody, MethodMarkers};
pub use optimize::{optimize, OptimizeConfig, OptimizeResult};
pub use passes::{
    NonNullArrayValue, NonNullFacts, Pass, PassContext, PassId, PassManager, PassRegistry,
};
pub use splitter::MethodSplitter;
pub use value::{ConstValue, RuntimeValue, Width};

pub mod class;
pub mod clone_map;
pub mod error;
pub mod inspect;
pub mod instruction;
pub mod list;
pub mod method;
pub mod optimize;
pub mod passes;
pub mod predicates;
pub mod splitter;
pub mod value;

#[cfg(test)]
pub mod testing;

// --- Core Identifiers ---

index_vec::define_index_type! {
    /// Unique identifier for an instruction slot within an `InsnList`
    pub struct InsnId = usize;
}

index_vec::define_index_type! {
    /// Unique identifier for a jump anchor within an `InsnList`
    pub struct LabelId = usize;
}

// --- Pretty Printing Support ---

/// Trait for pretty-printing IR constructs
pub trait PrettyPrint {
    fn pretty_print(&self, indent: usize) -> String;
}
