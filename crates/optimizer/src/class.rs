//! # Class Model
//!
//! The enclosing type a method belongs to: field declarations with their
//! mutability guarantees, plus the method collection that synthesized
//! helpers are appended to after all per-method work completes.

use rustc_hash::FxHashMap;

use crate::{MethodBody, RuntimeValue, Width};

/// A field declaration with the guarantees that license inlining.
///
/// `structurally_final` means the *reference* never changes after
/// construction, which licenses length inlining. `immutable_contents`
/// additionally promises the element values never change, which licenses
/// value inlining.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    /// Element width for array fields
    pub elem_width: Width,
    pub structurally_final: bool,
    pub immutable_contents: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, elem_width: Width) -> Self {
        Self {
            name: name.into(),
            elem_width,
            structurally_final: false,
            immutable_contents: false,
        }
    }

    pub const fn structurally_final(mut self) -> Self {
        self.structurally_final = true;
        self
    }

    /// Marks the contents immutable. Implies a structurally final reference.
    pub const fn immutable_contents(mut self) -> Self {
        self.structurally_final = true;
        self.immutable_contents = true;
        self
    }
}

/// A set of method bodies plus field declarations.
#[derive(Debug, Clone, Default)]
pub struct ClassModel {
    pub name: String,
    fields: FxHashMap<String, FieldDecl>,
    pub methods: Vec<MethodBody>,
}

impl ClassModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: FxHashMap::default(),
            methods: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: FieldDecl) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.get(name)
    }

    pub fn add_method(&mut self, method: MethodBody) {
        self.methods.push(method);
    }

    /// Appends helper methods produced by the splitter.
    ///
    /// Only called after all per-method optimization work completes, so the
    /// method collection is never mutated under iteration.
    pub fn attach_helpers(&mut self, helpers: Vec<MethodBody>) {
        self.methods.extend(helpers);
    }
}

/// Boundary operation: reflective read of a field's current value.
///
/// Must be deterministic for the lifetime of one optimization run.
pub trait FieldValueSource {
    /// Resolves the current value of a field, or `None` when the field does
    /// not exist on the supplied object.
    fn resolve_field_value(&self, field: &str) -> Option<RuntimeValue>;
}

/// A map-backed value source, used in production as a snapshot adapter and
/// throughout the test suite.
#[derive(Debug, Clone, Default)]
pub struct MapValueSource {
    values: FxHashMap<String, RuntimeValue>,
}

impl MapValueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: RuntimeValue) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: RuntimeValue) {
        self.values.insert(field.into(), value);
    }
}

impl FieldValueSource for MapValueSource {
    fn resolve_field_value(&self, field: &str) -> Option<RuntimeValue> {
        self.values.get(field).cloned()
    }
}
