//! # Method Body
//!
//! A method body is an instruction list plus its signature descriptor and
//! the declarative markers that gate which passes run on it.

use crate::{InsnList, PassId, Width};

/// Declarative markers attached to a method by the (external) metadata
/// discovery collaborator.
#[derive(Debug, Clone, Default)]
pub struct MethodMarkers {
    /// Is this method eligible for optimization at all?
    pub optimizable: bool,
    /// Does this method contain strict, statically unrollable loops?
    pub strict_loops: bool,
    /// Extra passes to append after the built-in list; resolved through the
    /// pass registry at configuration time
    pub extra_passes: Vec<PassId>,
    /// Fields this method promises never to mutate through, licensing value
    /// inlining even without a class-level immutable-contents flag
    pub strict_fields: Vec<String>,
}

/// One method's instruction list plus its type descriptor and markers.
#[derive(Debug, Clone)]
pub struct MethodBody {
    pub name: String,
    /// Parameter slots in signature order
    pub params: Vec<(u16, Width)>,
    /// Return width; `None` for void
    pub ret: Option<Width>,
    /// Maximum local-variable slot count
    pub max_locals: u16,
    pub insns: InsnList,
    pub markers: MethodMarkers,
}

impl MethodBody {
    pub fn new(name: impl Into<String>, ret: Option<Width>, max_locals: u16) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret,
            max_locals,
            insns: InsnList::new(),
            markers: MethodMarkers::default(),
        }
    }

    pub fn with_params(mut self, params: Vec<(u16, Width)>) -> Self {
        self.params = params;
        self
    }

    pub fn with_markers(mut self, markers: MethodMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Marks the method optimizable with default markers
    pub fn optimizable(mut self) -> Self {
        self.markers.optimizable = true;
        self
    }

    /// The name of the `n`-th split helper synthesized for this method
    pub fn helper_name(&self, n: usize) -> String {
        format!("{}$split{n}", self.name)
    }
}
