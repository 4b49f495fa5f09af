use crate::allocator::NodePtr;
use thiserror::Error;

/// The closed set of failures a run can end with. The first error aborts
/// the run; nothing is caught internally. Variants carry the offending
/// node where one exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalErr {
    #[error("bad encoding")]
    BadEncoding,

    #[error("atom too large")]
    TooLarge,

    #[error("trailing garbage after serialized node")]
    Trailing,

    #[error("cost exceeded")]
    CostExceeded,

    #[error("too many pairs")]
    TooManyPairs,

    #[error("too many atoms")]
    TooManyAtoms,

    #[error("operation stack limit reached")]
    EnvStackLimit,

    #[error("value stack limit reached")]
    ValStackLimit,

    #[error("path into atom")]
    PathIntoAtom(NodePtr),

    #[error("first of non-cons")]
    FirstOfNonCons(NodePtr),

    #[error("rest of non-cons")]
    RestOfNonCons(NodePtr),

    #[error("bad operand list")]
    BadOperandList(NodePtr),

    #[error("invalid operator")]
    InvalidOperator(NodePtr),

    #[error("reserved operator")]
    ReservedOperator(NodePtr),

    #[error("unknown softfork extension")]
    UnknownSoftforkExtension(NodePtr),

    #[error("softfork specified cost mismatch")]
    SoftforkCostMismatch(NodePtr),

    #[error("softfork program failed: {0}")]
    SoftforkFailed(Box<EvalErr>),

    #[error("{1}")]
    ArgType(NodePtr, &'static str),

    #[error("{1}")]
    ArgSize(NodePtr, &'static str),

    #[error("div with 0")]
    DivByZero(NodePtr),

    #[error("mod with 0")]
    ModByZero(NodePtr),

    #[error("modpow with negative exponent")]
    NegativeExponent(NodePtr),

    #[error("shift too large")]
    ShiftTooLarge(NodePtr),

    #[error("invalid indices for substr")]
    InvalidSubstr(NodePtr),

    #[error("{1}")]
    InvalidCurvePoint(NodePtr, &'static str),

    #[error("{1}")]
    SignatureVerifyFailed(NodePtr, &'static str),

    #[error("clvm raise")]
    ClvmRaise(NodePtr),

    #[error("internal error: {1}")]
    InternalError(NodePtr, &'static str),
}

impl EvalErr {
    /// The subtree the error is about, when one exists. Serde errors and
    /// resource-limit errors have no meaningful node.
    pub fn node_ptr(&self) -> Option<NodePtr> {
        match self {
            Self::BadEncoding
            | Self::TooLarge
            | Self::Trailing
            | Self::CostExceeded
            | Self::TooManyPairs
            | Self::TooManyAtoms
            | Self::EnvStackLimit
            | Self::ValStackLimit => None,
            Self::SoftforkFailed(inner) => inner.node_ptr(),
            Self::PathIntoAtom(n)
            | Self::FirstOfNonCons(n)
            | Self::RestOfNonCons(n)
            | Self::BadOperandList(n)
            | Self::InvalidOperator(n)
            | Self::ReservedOperator(n)
            | Self::UnknownSoftforkExtension(n)
            | Self::SoftforkCostMismatch(n)
            | Self::ArgType(n, _)
            | Self::ArgSize(n, _)
            | Self::DivByZero(n)
            | Self::ModByZero(n)
            | Self::NegativeExponent(n)
            | Self::ShiftTooLarge(n)
            | Self::InvalidSubstr(n)
            | Self::InvalidCurvePoint(n, _)
            | Self::SignatureVerifyFailed(n, _)
            | Self::ClvmRaise(n)
            | Self::InternalError(n, _) => Some(*n),
        }
    }
}
