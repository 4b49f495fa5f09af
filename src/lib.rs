//! A deterministic, cost-metered virtual machine for programs expressed
//! as binary trees of byte-string atoms and pairs. Programs reduce
//! against an environment under a fixed operator set; every primitive
//! charges an exact cost against a caller-supplied budget, and results,
//! costs and errors are bit-for-bit reproducible across platforms.

pub mod allocator;
pub mod bls_ops;
pub mod chia_dialect;
pub mod core_ops;
pub mod cost;
pub mod dialect;
pub mod error;
pub mod more_ops;
pub mod number;
pub mod op_utils;
pub mod reduction;
pub mod run_program;
pub mod run_serialized;
pub mod secp_ops;
pub mod serde;
pub mod tree_hash;

pub use allocator::{Allocator, Atom, NodePtr, SExp};
pub use chia_dialect::{
    ChiaDialect, ENABLE_BLS_OPS_OUTSIDE_GUARD, ENABLE_KECCAK_OPS_OUTSIDE_GUARD, ENABLE_SECP_OPS,
    LIMIT_HEAP, MEMPOOL_MODE, NO_UNKNOWN_OPS, REQUIRE_MINIMAL_INTS,
};
pub use cost::Cost;
pub use dialect::{Dialect, OperatorSet};
pub use error::EvalErr;
pub use reduction::{Reduction, Response};
pub use run_program::run_program;
pub use run_serialized::{
    make_allocator, run_serialized_program, run_serialized_program_lazy, LazyReduction,
};
pub use serde::{node_from_bytes, node_to_bytes, serialized_length_from_bytes};
pub use tree_hash::{tree_hash, tree_hash_from_bytes, TreeHash};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
