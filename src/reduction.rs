use crate::allocator::NodePtr;
use crate::cost::Cost;
use crate::error::EvalErr;

/// The outcome of a successful operator invocation or program run: the
/// total cost charged and the resulting node.
#[derive(Debug, PartialEq, Eq)]
pub struct Reduction(pub Cost, pub NodePtr);

pub type Response = Result<Reduction, EvalErr>;
