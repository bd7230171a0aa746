//! Error kinds raised by the optimization pipeline.
//!
//! All of these are fatal to the optimization of the current method only:
//! the entry point catches them and returns the original body unchanged.

/// A structural failure inside a pass or the splitter.
///
/// These are deterministic: the same input produces the same error, so no
/// retry logic exists anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptError {
    /// A pass's precondition pattern partially matched but the tail was
    /// structurally invalid, e.g. a branch whose label is missing.
    #[error("malformed instruction sequence: {0}")]
    MalformedInstructionSequence(String),

    /// An external value lookup failed, e.g. the referenced field does not
    /// exist on the supplied value source.
    #[error("unresolvable value: {0}")]
    UnresolvableValue(String),

    /// A construct the passes are not specified to handle, e.g. an array
    /// value chain beyond the supported depth.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// The method splitter cannot produce a block within the size limit.
    #[error("size constraint violation: {0}")]
    SizeConstraintViolation(String),
}

impl OptError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInstructionSequence(msg.into())
    }

    pub fn unresolvable(msg: impl Into<String>) -> Self {
        Self::UnresolvableValue(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedConstruct(msg.into())
    }

    pub fn size_constraint(msg: impl Into<String>) -> Self {
        Self::SizeConstraintViolation(msg.into())
    }
}
