//! # Optimization Entry Point
//!
//! Runs the configured pass pipeline over one method to a fixed point, then
//! applies the size-bounded splitter once. Failure anywhere is contained to
//! the method: the caller always gets a usable body back, the original one
//! when optimization had to be abandoned.

use crate::passes::{PassManager, PassRegistry};
use crate::splitter::MethodSplitter;
use crate::{predicates, ClassModel, FieldValueSource, MethodBody, OptError};

/// Tunable limits of one optimization run.
#[derive(Debug, Clone)]
pub struct OptimizeConfig {
    /// Upper bound on a method body's encoded size; larger bodies are split
    pub max_method_size: usize,
    /// Fuse on the pass fixed-point iteration
    pub max_fixed_point_rounds: usize,
    /// Fuse on simulated loop trip counts
    pub max_unroll_count: u32,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            max_method_size: 65535,
            max_fixed_point_rounds: 32,
            max_unroll_count: 1024,
        }
    }
}

/// Outcome of optimizing one method.
#[derive(Debug, Clone)]
pub struct OptimizeResult {
    pub method: MethodBody,
    /// Split helpers, in call order; empty when no split was needed
    pub helpers: Vec<MethodBody>,
    /// Whether the returned method differs from the input
    pub changed: bool,
}

/// Optimizes one method against its class and a field-value snapshot.
///
/// Methods not marked optimizable pass through untouched. Any structural
/// error abandons the attempt and returns the original body unchanged;
/// optimization is best-effort per method and never fails the caller.
pub fn optimize(
    method: &MethodBody,
    class: &ClassModel,
    values: &dyn FieldValueSource,
    config: &OptimizeConfig,
) -> OptimizeResult {
    if !predicates::is_optimization_candidate(method) {
        return OptimizeResult {
            method: method.clone(),
            helpers: Vec::new(),
            changed: false,
        };
    }
    match try_optimize(method, class, values, config) {
        Ok(result) => result,
        Err(err) => {
            log::warn!("optimization of '{}' abandoned: {err}", method.name);
            OptimizeResult {
                method: method.clone(),
                helpers: Vec::new(),
                changed: false,
            }
        }
    }
}

fn try_optimize(
    method: &MethodBody,
    class: &ClassModel,
    values: &dyn FieldValueSource,
    config: &OptimizeConfig,
) -> Result<OptimizeResult, OptError> {
    let mut working = method.clone();
    working.insns.validate()?;

    let registry = PassRegistry::default();
    let mut manager = PassManager::for_method(&working, &registry, config)?;
    let rewritten = manager.run(&mut working, class, values, config)?;
    working.insns.validate()?;

    let before_split = working.insns.render();
    let (split, helpers) = MethodSplitter::new(config).split(working)?;
    let changed = rewritten || !helpers.is_empty() || split.insns.render() != before_split;

    Ok(OptimizeResult {
        method: split,
        helpers,
        changed,
    })
}
