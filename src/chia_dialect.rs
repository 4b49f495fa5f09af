use crate::allocator::{Allocator, NodePtr};
use crate::bls_ops::{
    op_bls_g1_multiply, op_bls_g1_negate, op_bls_g1_subtract, op_bls_g2_add, op_bls_g2_multiply,
    op_bls_g2_negate, op_bls_g2_subtract, op_bls_map_to_g1, op_bls_map_to_g2,
    op_bls_pairing_identity, op_bls_verify,
};
use crate::core_ops::{op_cons, op_eq, op_first, op_if, op_listp, op_raise, op_rest};
use crate::cost::Cost;
use crate::dialect::{Dialect, OperatorSet};
use crate::error::EvalErr;
use crate::more_ops::{
    op_add, op_all, op_any, op_ash, op_coinid, op_concat, op_div, op_divmod, op_gr, op_gr_bytes,
    op_keccak256, op_logand, op_logior, op_lognot, op_logxor, op_lsh, op_mod, op_modpow,
    op_multiply, op_not, op_point_add, op_pubkey_for_exp, op_sha256, op_strlen, op_substr,
    op_subtract, op_unknown,
};
use crate::reduction::Response;
use crate::secp_ops::{op_secp256k1_verify, op_secp256r1_verify};

/// Unknown operators are hard failures instead of cost-accounted no-ops.
pub const NO_UNKNOWN_OPS: u32 = 0x0002;

/// Limit the allocator to a 500 MB heap.
pub const LIMIT_HEAP: u32 = 0x0004;

/// Operators taking integer arguments reject redundant encodings.
pub const REQUIRE_MINIMAL_INTS: u32 = 0x0008;

/// Make the BLS extension ops (including coinid, modpow and %)
/// available outside the softfork guard.
pub const ENABLE_BLS_OPS_OUTSIDE_GUARD: u32 = 0x0010;

/// Make the secp256 signature verifiers available outside the softfork
/// guard.
pub const ENABLE_SECP_OPS: u32 = 0x0020;

/// Make keccak256 available outside the softfork guard.
pub const ENABLE_KECCAK_OPS_OUTSIDE_GUARD: u32 = 0x0100;

/// The stricter dialect used when screening transactions for the
/// mempool.
pub const MEMPOOL_MODE: u32 = NO_UNKNOWN_OPS | LIMIT_HEAP | REQUIRE_MINIMAL_INTS;

const QUOTE_KW: u32 = 0x01;
const APPLY_KW: u32 = 0x02;
const SOFTFORK_KW: u32 = 0x24;

type OpFn = fn(&mut Allocator, NodePtr, Cost, u32) -> Response;

/// The production operator set, parameterized by the run's flags.
pub struct ChiaDialect {
    flags: u32,
}

impl ChiaDialect {
    pub fn new(flags: u32) -> ChiaDialect {
        ChiaDialect { flags }
    }

    fn unknown_op(
        &self,
        allocator: &mut Allocator,
        o: NodePtr,
        args: NodePtr,
        max_cost: Cost,
    ) -> Response {
        if !self.allow_unknown_ops() {
            return Err(EvalErr::InvalidOperator(o));
        }
        op_unknown(allocator, o, args, max_cost)
    }
}

impl Dialect for ChiaDialect {
    fn quote_kw(&self) -> u32 {
        QUOTE_KW
    }

    fn apply_kw(&self) -> u32 {
        APPLY_KW
    }

    fn softfork_kw(&self) -> u32 {
        SOFTFORK_KW
    }

    fn softfork_extension(&self, ext: u32) -> Option<OperatorSet> {
        match ext {
            0 => Some(OperatorSet::Bls),
            1 => Some(OperatorSet::Keccak),
            _ => None,
        }
    }

    fn allow_unknown_ops(&self) -> bool {
        self.flags & NO_UNKNOWN_OPS == 0
    }

    fn op(
        &self,
        allocator: &mut Allocator,
        o: NodePtr,
        argument_list: NodePtr,
        max_cost: Cost,
        extension: OperatorSet,
    ) -> Response {
        let Some(op) = allocator.small_number(o) else {
            // all known opcodes are canonical small integers; this one
            // can only be unknown
            return self.unknown_op(allocator, o, argument_list, max_cost);
        };

        let bls_enabled =
            self.flags & ENABLE_BLS_OPS_OUTSIDE_GUARD != 0 || extension == OperatorSet::Bls;
        let secp_enabled = self.flags & ENABLE_SECP_OPS != 0 || extension == OperatorSet::Bls;
        let keccak_enabled =
            self.flags & ENABLE_KECCAK_OPS_OUTSIDE_GUARD != 0 || extension == OperatorSet::Keccak;

        let f: OpFn = match op {
            // 1 and 2 (quote and apply) are handled in the evaluator
            3 => op_if,
            4 => op_cons,
            5 => op_first,
            6 => op_rest,
            7 => op_listp,
            8 => op_raise,
            9 => op_eq,
            10 => op_gr_bytes,
            11 => op_sha256,
            12 => op_substr,
            13 => op_strlen,
            14 => op_concat,
            16 => op_add,
            17 => op_subtract,
            18 => op_multiply,
            19 => op_div,
            20 => op_divmod,
            21 => op_gr,
            22 => op_ash,
            23 => op_lsh,
            24 => op_logand,
            25 => op_logior,
            26 => op_logxor,
            27 => op_lognot,
            29 => op_point_add,
            30 => op_pubkey_for_exp,
            32 => op_not,
            33 => op_any,
            34 => op_all,
            48 if bls_enabled => op_coinid,
            49 if bls_enabled => op_bls_g1_subtract,
            50 if bls_enabled => op_bls_g1_multiply,
            51 if bls_enabled => op_bls_g1_negate,
            52 if bls_enabled => op_bls_g2_add,
            53 if bls_enabled => op_bls_g2_subtract,
            54 if bls_enabled => op_bls_g2_multiply,
            55 if bls_enabled => op_bls_g2_negate,
            56 if bls_enabled => op_bls_map_to_g1,
            57 if bls_enabled => op_bls_map_to_g2,
            58 if bls_enabled => op_bls_pairing_identity,
            59 if bls_enabled => op_bls_verify,
            60 if bls_enabled => op_modpow,
            61 if bls_enabled => op_mod,
            62 if keccak_enabled => op_keccak256,
            0x13d6_1f00 if secp_enabled => op_secp256k1_verify,
            0x1c3a_8f00 if secp_enabled => op_secp256r1_verify,
            _ => {
                return self.unknown_op(allocator, o, argument_list, max_cost);
            }
        };
        f(allocator, argument_list, max_cost, self.flags)
    }
}
