use crate::allocator::{Allocator, NodePtr};
use crate::cost::Cost;
use crate::reduction::Response;

/// The operator sets that can be activated inside a softfork guard.
/// This is a closed, versioned enum: extension ids map onto it or are
/// rejected, new sets cannot appear at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSet {
    /// No extension ops beyond what the run's flags enable.
    Default,
    /// BLS ops, coinid, modpow, % and the secp verifiers.
    Bls,
    /// keccak256.
    Keccak,
}

/// The operator semantics the evaluator runs against: keyword atoms for
/// the three structural forms, operator dispatch, and the softfork
/// extension policy.
pub trait Dialect {
    fn quote_kw(&self) -> u32;
    fn apply_kw(&self) -> u32;
    fn softfork_kw(&self) -> u32;
    /// Map a softfork extension id to its operator set, or None if the
    /// id is not known to this dialect.
    fn softfork_extension(&self, ext: u32) -> Option<OperatorSet>;
    fn allow_unknown_ops(&self) -> bool;
    fn op(
        &self,
        allocator: &mut Allocator,
        op: NodePtr,
        args: NodePtr,
        max_cost: Cost,
        extension: OperatorSet,
    ) -> Response;
}
