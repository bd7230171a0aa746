//! # Optimization Passes
//!
//! This module defines the pass abstraction, the explicit pass registry, and
//! the fixed-point driver that runs a configured pass list over a method's
//! instruction list until a full round makes no change.

pub mod arith_fold;
pub mod array_length;
pub mod array_value;
pub mod branch_elim;
pub mod dead_locals;
pub mod local_arrays;
pub mod local_values;
pub mod loop_unroll;

pub use arith_fold::ArithmeticFold;
pub use array_length::{FieldArrayLengthInline, LocalArrayLengthInline};
pub use array_value::{FieldArrayValueInline, LocalArrayValueInline};
pub use branch_elim::BranchEliminate;
pub use dead_locals::DeadLocalStores;
pub use local_values::LocalValueInline;
pub use loop_unroll::LoopUnroll;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{
    predicates, ClassModel, FieldValueSource, InsnId, MethodBody, OptError, OptimizeConfig,
};

/// A statically-known non-null array element that could not be folded to a
/// constant (e.g. a nested array).
///
/// Produced by the array-value inliners, consumed read-only by the branch
/// eliminator within the same fixed-point round, and rebuilt every round:
/// the guarding instructions it references may themselves be rewritten.
#[derive(Debug, Clone)]
pub struct NonNullArrayValue {
    /// Every instruction of the access chain, in list order, so a consumer
    /// that resolves the fact can remove the chain in one transaction
    pub chain: SmallVec<[InsnId; 4]>,
}

/// Per-round table of non-null facts, keyed by the last instruction of each
/// recorded access chain.
#[derive(Debug, Default)]
pub struct NonNullFacts {
    facts: FxHashMap<InsnId, NonNullArrayValue>,
}

impl NonNullFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, fact: NonNullArrayValue) {
        debug_assert!(!fact.chain.is_empty());
        self.facts.insert(fact.chain[fact.chain.len() - 1], fact);
    }

    /// The fact whose chain ends at `id`, if any
    pub fn ending_at(&self, id: InsnId) -> Option<&NonNullArrayValue> {
        self.facts.get(&id)
    }

    pub fn take(&mut self, id: InsnId) -> Option<NonNullArrayValue> {
        self.facts.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Shared context handed to every pass invocation.
pub struct PassContext<'a> {
    pub class: &'a ClassModel,
    pub values: &'a dyn FieldValueSource,
    pub facts: &'a mut NonNullFacts,
    pub config: &'a OptimizeConfig,
}

/// A rewrite pass over one method's instruction list.
///
/// Passes are stateless per invocation: `run` reports whether it changed
/// anything, and the driver re-invokes the whole list until a full round
/// reports no change. A pass must not be re-entered on the same list from
/// within itself.
pub trait Pass {
    /// Apply this pass to a method body.
    /// Returns true if the body was modified.
    fn run(&mut self, method: &mut MethodBody, cx: &mut PassContext<'_>)
        -> Result<bool, OptError>;

    /// Get the name of this pass for debugging
    fn name(&self) -> &'static str;
}

/// A wrapper for conditional pass execution.
///
/// Allows passes to be skipped based on method markers, so marker-gated
/// passes (like the loop unroller) stay out of methods that never asked for
/// them.
pub struct ConditionalPass {
    pass: Box<dyn Pass>,
    condition: fn(&MethodBody) -> bool,
}

impl ConditionalPass {
    pub fn new(pass: Box<dyn Pass>, condition: fn(&MethodBody) -> bool) -> Self {
        Self { pass, condition }
    }
}

impl Pass for ConditionalPass {
    fn run(
        &mut self,
        method: &mut MethodBody,
        cx: &mut PassContext<'_>,
    ) -> Result<bool, OptError> {
        if (self.condition)(method) {
            self.pass.run(method, cx)
        } else {
            Ok(false)
        }
    }

    fn name(&self) -> &'static str {
        self.pass.name()
    }
}

/// Identifier of a registered pass.
///
/// Extra passes requested by method metadata name one of these; the registry
/// resolves them at configuration time instead of reflective lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    ArithmeticFold,
    FieldArrayLength,
    LocalArrayLength,
    FieldArrayValue,
    LocalArrayValue,
    LocalValueInline,
    BranchEliminate,
    LoopUnroll,
    DeadLocalStores,
}

/// Explicit registry mapping pass identifiers to constructors, validated at
/// configuration-load time.
pub struct PassRegistry {
    factories: FxHashMap<PassId, fn() -> Box<dyn Pass>>,
}

impl Default for PassRegistry {
    fn default() -> Self {
        let mut factories: FxHashMap<PassId, fn() -> Box<dyn Pass>> = FxHashMap::default();
        factories.insert(PassId::ArithmeticFold, || Box::new(ArithmeticFold::new()));
        factories.insert(PassId::FieldArrayLength, || {
            Box::new(FieldArrayLengthInline::new())
        });
        factories.insert(PassId::LocalArrayLength, || {
            Box::new(LocalArrayLengthInline::new())
        });
        factories.insert(PassId::FieldArrayValue, || {
            Box::new(FieldArrayValueInline::new())
        });
        factories.insert(PassId::LocalArrayValue, || {
            Box::new(LocalArrayValueInline::new())
        });
        factories.insert(PassId::LocalValueInline, || Box::new(LocalValueInline::new()));
        factories.insert(PassId::BranchEliminate, || Box::new(BranchEliminate::new()));
        factories.insert(PassId::LoopUnroll, || Box::new(LoopUnroll::new()));
        factories.insert(PassId::DeadLocalStores, || Box::new(DeadLocalStores::new()));
        Self { factories }
    }
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates one registered pass
    pub fn instantiate(&self, id: PassId) -> Result<Box<dyn Pass>, OptError> {
        self.factories
            .get(&id)
            .map(|factory| factory())
            .ok_or_else(|| OptError::unsupported(format!("pass {id:?} is not registered")))
    }

    /// Resolves an ordered identifier list into pass instances
    pub fn resolve(&self, ids: &[PassId]) -> Result<Vec<Box<dyn Pass>>, OptError> {
        ids.iter().map(|&id| self.instantiate(id)).collect()
    }
}

/// A pass manager that runs its pass list to a fixed point.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    max_rounds: usize,
}

impl PassManager {
    /// Create a new pass manager that runs a single round
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            max_rounds: 1,
        }
    }

    /// Create a pass manager that iterates until convergence, bounded by
    /// `max_rounds`
    pub fn with_fixed_point(max_rounds: usize) -> Self {
        Self {
            passes: Vec::new(),
            max_rounds,
        }
    }

    /// Add a pass to the manager
    pub fn add_pass<P: Pass + 'static>(mut self, pass: P) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Add an already-boxed pass (registry output)
    pub fn add_boxed_pass(mut self, pass: Box<dyn Pass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Add a conditional pass; it only runs when the condition holds for the
    /// method being optimized
    pub fn add_conditional_pass<P: Pass + 'static>(
        mut self,
        pass: P,
        condition: fn(&MethodBody) -> bool,
    ) -> Self {
        self.passes
            .push(Box::new(ConditionalPass::new(Box::new(pass), condition)));
        self
    }

    /// Assembles the built-in pipeline for one method: the standard pass
    /// list, the marker-gated loop unroller, and any extra passes the
    /// method's metadata requests through the registry.
    pub fn for_method(
        method: &MethodBody,
        registry: &PassRegistry,
        config: &OptimizeConfig,
    ) -> Result<Self, OptError> {
        let mut manager = Self::with_fixed_point(config.max_fixed_point_rounds)
            .add_pass(ArithmeticFold::new())
            .add_pass(FieldArrayLengthInline::new())
            .add_pass(LocalArrayLengthInline::new())
            .add_pass(FieldArrayValueInline::new())
            .add_pass(LocalArrayValueInline::new())
            .add_pass(LocalValueInline::new())
            .add_conditional_pass(LoopUnroll::new(), predicates::is_strict_loop_candidate)
            .add_pass(BranchEliminate::new())
            .add_pass(DeadLocalStores::new());
        for pass in registry.resolve(&method.markers.extra_passes)? {
            manager = manager.add_boxed_pass(pass);
        }
        Ok(manager)
    }

    /// Runs all passes to a fixed point.
    ///
    /// Non-null facts are rebuilt from scratch every round; the producing
    /// and consuming passes only ever see facts from the same round.
    /// Returns true if any round modified the method.
    pub fn run(
        &mut self,
        method: &mut MethodBody,
        class: &ClassModel,
        values: &dyn FieldValueSource,
        config: &OptimizeConfig,
    ) -> Result<bool, OptError> {
        let mut any = false;
        for round in 0..self.max_rounds {
            let mut facts = NonNullFacts::new();
            let mut changed = false;
            for pass in &mut self.passes {
                let mut cx = PassContext {
                    class,
                    values,
                    facts: &mut facts,
                    config,
                };
                if pass.run(method, &mut cx)? {
                    changed = true;
                    log::debug!(
                        "pass '{}' modified method '{}' (round {round})",
                        pass.name(),
                        method.name
                    );
                }
            }
            if !changed {
                return Ok(any);
            }
            any = true;
        }
        log::debug!(
            "method '{}' did not converge within {} rounds",
            method.name,
            self.max_rounds
        );
        Ok(any)
    }
}
