use crate::allocator::{Allocator, NodePtr};
use crate::chia_dialect::{ChiaDialect, LIMIT_HEAP};
use crate::cost::Cost;
use crate::error::EvalErr;
use crate::reduction::Reduction;
use crate::run_program::run_program;
use crate::serde::{node_from_bytes, node_to_bytes};
use crate::tree_hash::{tree_hash, TreeHash};

/// The allocator a run should use for the given flags. Mempool-style
/// validation caps the heap, everything else gets the full range.
pub fn make_allocator(flags: u32) -> Allocator {
    if flags & LIMIT_HEAP != 0 {
        Allocator::new_limited(500_000_000)
    } else {
        Allocator::new_limited(u32::MAX as usize)
    }
}

/// The result of a run that keeps its arena alive: the result can be
/// inspected, hashed and serialized on demand without an eager copy.
pub struct LazyReduction {
    allocator: Allocator,
    cost: Cost,
    node: NodePtr,
}

impl LazyReduction {
    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn node(&self) -> NodePtr {
        self.node
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EvalErr> {
        node_to_bytes(&self.allocator, self.node)
    }

    pub fn tree_hash(&self) -> TreeHash {
        tree_hash(&self.allocator, self.node)
    }
}

/// Parse program and environment, run under the budget and flags, and
/// keep the arena alive for zero-copy access to the result.
pub fn run_serialized_program_lazy(
    program: &[u8],
    env: &[u8],
    max_cost: Cost,
    flags: u32,
) -> Result<LazyReduction, EvalErr> {
    let mut allocator = make_allocator(flags);
    let program = node_from_bytes(&mut allocator, program)?;
    let env = node_from_bytes(&mut allocator, env)?;
    let dialect = ChiaDialect::new(flags);
    let Reduction(cost, node) = run_program(&mut allocator, &dialect, program, env, max_cost)?;
    Ok(LazyReduction {
        allocator,
        cost,
        node,
    })
}

/// Parse program and environment, run under the budget and flags, and
/// return the cost together with the canonical serialization of the
/// result. The arena is released before returning.
pub fn run_serialized_program(
    program: &[u8],
    env: &[u8],
    max_cost: Cost,
    flags: u32,
) -> Result<(Cost, Vec<u8>), EvalErr> {
    let reduction = run_serialized_program_lazy(program, env, max_cost, flags)?;
    Ok((reduction.cost(), reduction.to_bytes()?))
}
