use crate::allocator::{Allocator, NodePtr, SExp};
use crate::bls_ops::g1_atom;
use crate::chia_dialect::REQUIRE_MINIMAL_INTS;
use crate::cost::{check_cost, Cost};
use crate::error::EvalErr;
use crate::number::Number;
use crate::op_utils::{
    arg_count, atom, get_args, i32_atom, int_atom, malloc_cost, mod_group_order, new_atom_and_cost,
    nullp, number_to_scalar, uint_atom, MALLOC_COST_PER_BYTE,
};
use crate::reduction::{Reduction, Response};
use bls12_381::{G1Affine, G1Projective};
use clvm_sha2::Sha256;
use group::Group;
use num_bigint::Sign;
use num_traits::Zero;
use sha3::{Digest, Keccak256};

const ARITH_BASE_COST: Cost = 99;
const ARITH_COST_PER_ARG: Cost = 320;
const ARITH_COST_PER_BYTE: Cost = 3;

const LOG_BASE_COST: Cost = 100;
const LOG_COST_PER_ARG: Cost = 264;
const LOG_COST_PER_BYTE: Cost = 3;

const LOGNOT_BASE_COST: Cost = 331;
const LOGNOT_COST_PER_BYTE: Cost = 3;

const MUL_BASE_COST: Cost = 92;
const MUL_COST_PER_OP: Cost = 885;
const MUL_LINEAR_COST_PER_BYTE: Cost = 6;
const MUL_SQUARE_COST_PER_BYTE_DIVIDER: Cost = 128;

const GR_BASE_COST: Cost = 498;
const GR_COST_PER_BYTE: Cost = 2;

const GRS_BASE_COST: Cost = 117;
const GRS_COST_PER_BYTE: Cost = 1;

const STRLEN_BASE_COST: Cost = 173;
const STRLEN_COST_PER_BYTE: Cost = 1;

const CONCAT_BASE_COST: Cost = 142;
const CONCAT_COST_PER_ARG: Cost = 135;
const CONCAT_COST_PER_BYTE: Cost = 3;

const DIV_BASE_COST: Cost = 988;
const DIV_COST_PER_BYTE: Cost = 4;

const DIVMOD_BASE_COST: Cost = 1116;
const DIVMOD_COST_PER_BYTE: Cost = 6;

const MOD_BASE_COST: Cost = 988;
const MOD_COST_PER_BYTE: Cost = 4;

const MODPOW_BASE_COST: Cost = 17000;
const MODPOW_COST_PER_BYTE_BASE_VALUE: Cost = 38;
const MODPOW_COST_PER_BYTE_EXPONENT: Cost = 3;
const MODPOW_COST_PER_BYTE_MOD: Cost = 21;

const SHA256_BASE_COST: Cost = 87;
const SHA256_COST_PER_ARG: Cost = 134;
const SHA256_COST_PER_BYTE: Cost = 2;

const KECCAK256_BASE_COST: Cost = 50;
const KECCAK256_COST_PER_ARG: Cost = 160;
const KECCAK256_COST_PER_BYTE: Cost = 2;

const ASHIFT_BASE_COST: Cost = 596;
const ASHIFT_COST_PER_BYTE: Cost = 3;

const LSHIFT_BASE_COST: Cost = 277;
const LSHIFT_COST_PER_BYTE: Cost = 3;

const BOOL_BASE_COST: Cost = 200;
const BOOL_COST_PER_ARG: Cost = 300;

const POINT_ADD_BASE_COST: Cost = 101094;
const POINT_ADD_COST_PER_ARG: Cost = 1343980;

const PUBKEY_BASE_COST: Cost = 1325730;
const PUBKEY_COST_PER_BYTE: Cost = 38;

const COINID_COST: Cost = 800;

const SHIFT_LIMIT_BITS: i32 = 65535;

fn require_minimal(flags: u32) -> bool {
    flags & REQUIRE_MINIMAL_INTS != 0
}

pub fn op_sha256(a: &mut Allocator, input: NodePtr, max_cost: Cost, _flags: u32) -> Response {
    let mut cost = SHA256_BASE_COST;
    check_cost(cost, max_cost)?;
    let mut byte_count: usize = 0;
    let mut hasher = Sha256::new();
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += SHA256_COST_PER_ARG;
        check_cost(cost + byte_count as Cost * SHA256_COST_PER_BYTE, max_cost)?;
        let blob = atom(a, arg, "sha256 on list")?;
        byte_count += blob.as_ref().len();
        hasher.update(blob.as_ref());
    }
    cost += byte_count as Cost * SHA256_COST_PER_BYTE;
    check_cost(cost, max_cost)?;
    new_atom_and_cost(a, cost, &hasher.finalize())
}

pub fn op_keccak256(a: &mut Allocator, input: NodePtr, max_cost: Cost, _flags: u32) -> Response {
    let mut cost = KECCAK256_BASE_COST;
    check_cost(cost, max_cost)?;
    let mut byte_count: usize = 0;
    let mut hasher = Keccak256::new();
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += KECCAK256_COST_PER_ARG;
        check_cost(cost + byte_count as Cost * KECCAK256_COST_PER_BYTE, max_cost)?;
        let blob = atom(a, arg, "keccak256 on list")?;
        byte_count += blob.as_ref().len();
        hasher.update(blob.as_ref());
    }
    cost += byte_count as Cost * KECCAK256_COST_PER_BYTE;
    check_cost(cost, max_cost)?;
    let hash: [u8; 32] = hasher.finalize().into();
    new_atom_and_cost(a, cost, &hash)
}

pub fn op_add(a: &mut Allocator, input: NodePtr, max_cost: Cost, flags: u32) -> Response {
    let mut cost = ARITH_BASE_COST;
    let mut byte_count: usize = 0;
    let mut total: Number = Number::zero();
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += ARITH_COST_PER_ARG;
        check_cost(cost + byte_count as Cost * ARITH_COST_PER_BYTE, max_cost)?;
        let (v, len) = int_atom(a, arg, require_minimal(flags), "+ requires int args")?;
        byte_count += len;
        total += v;
    }
    cost += byte_count as Cost * ARITH_COST_PER_BYTE;
    check_cost(cost, max_cost)?;
    let total = a.new_number(total)?;
    Ok(malloc_cost(a, cost, total))
}

pub fn op_subtract(a: &mut Allocator, input: NodePtr, max_cost: Cost, flags: u32) -> Response {
    let mut cost = ARITH_BASE_COST;
    let mut byte_count: usize = 0;
    let mut total: Number = Number::zero();
    let mut is_first = true;
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += ARITH_COST_PER_ARG;
        check_cost(cost + byte_count as Cost * ARITH_COST_PER_BYTE, max_cost)?;
        let (v, len) = int_atom(a, arg, require_minimal(flags), "- requires int args")?;
        byte_count += len;
        if is_first {
            total += v;
        } else {
            total -= v;
        }
        is_first = false;
    }
    cost += byte_count as Cost * ARITH_COST_PER_BYTE;
    check_cost(cost, max_cost)?;
    let total = a.new_number(total)?;
    Ok(malloc_cost(a, cost, total))
}

pub fn op_multiply(a: &mut Allocator, input: NodePtr, max_cost: Cost, flags: u32) -> Response {
    let mut cost = MUL_BASE_COST;
    check_cost(cost, max_cost)?;
    let mut first_iter = true;
    let mut total: Number = Number::from(1);
    let mut l0: usize = 0;
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        let (v, l1) = int_atom(a, arg, require_minimal(flags), "* requires int args")?;
        if first_iter {
            total = v;
            l0 = l1;
            first_iter = false;
            continue;
        }
        cost += MUL_COST_PER_OP
            + (l0 as Cost + l1 as Cost) * MUL_LINEAR_COST_PER_BYTE
            + (l0 as Cost * l1 as Cost) / MUL_SQUARE_COST_PER_BYTE_DIVIDER;
        check_cost(cost, max_cost)?;
        total *= v;
        l0 = (total.bits() as usize + 8) / 8;
    }
    let total = a.new_number(total)?;
    Ok(malloc_cost(a, cost, total))
}

/// floor division, the quotient rounds toward negative infinity and the
/// remainder takes the divisor's sign
fn div_mod_floor(numerator: &Number, denominator: &Number) -> (Number, Number) {
    let q = numerator / denominator;
    let r = numerator % denominator;
    if !r.is_zero() && r.sign() != denominator.sign() {
        (q - 1, r + denominator)
    } else {
        (q, r)
    }
}

pub fn op_div(a: &mut Allocator, input: NodePtr, _max_cost: Cost, flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, "/ takes exactly 2 arguments")?;
    let (a0, l0) = int_atom(a, n0, require_minimal(flags), "/ requires int args")?;
    let (a1, l1) = int_atom(a, n1, require_minimal(flags), "/ requires int args")?;
    let cost = DIV_BASE_COST + (l0 as Cost + l1 as Cost) * DIV_COST_PER_BYTE;
    if a1.is_zero() {
        return Err(EvalErr::DivByZero(n1));
    }
    let (q, _) = div_mod_floor(&a0, &a1);
    let q = a.new_number(q)?;
    Ok(malloc_cost(a, cost, q))
}

pub fn op_divmod(a: &mut Allocator, input: NodePtr, _max_cost: Cost, flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, "divmod takes exactly 2 arguments")?;
    let (a0, l0) = int_atom(a, n0, require_minimal(flags), "divmod requires int args")?;
    let (a1, l1) = int_atom(a, n1, require_minimal(flags), "divmod requires int args")?;
    let cost = DIVMOD_BASE_COST + (l0 as Cost + l1 as Cost) * DIVMOD_COST_PER_BYTE;
    if a1.is_zero() {
        return Err(EvalErr::DivByZero(n1));
    }
    let (q, r) = div_mod_floor(&a0, &a1);
    let q = a.new_number(q)?;
    let r = a.new_number(r)?;
    let malloc = (a.atom_len(q) as Cost + a.atom_len(r) as Cost) * MALLOC_COST_PER_BYTE;
    let node = a.new_pair(q, r)?;
    Ok(Reduction(cost + malloc, node))
}

pub fn op_mod(a: &mut Allocator, input: NodePtr, _max_cost: Cost, flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, "% takes exactly 2 arguments")?;
    let (a0, l0) = int_atom(a, n0, require_minimal(flags), "% requires int args")?;
    let (a1, l1) = int_atom(a, n1, require_minimal(flags), "% requires int args")?;
    let cost = MOD_BASE_COST + (l0 as Cost + l1 as Cost) * MOD_COST_PER_BYTE;
    if a1.is_zero() {
        return Err(EvalErr::DivByZero(n1));
    }
    let (_, r) = div_mod_floor(&a0, &a1);
    let r = a.new_number(r)?;
    Ok(malloc_cost(a, cost, r))
}

pub fn op_modpow(a: &mut Allocator, input: NodePtr, max_cost: Cost, flags: u32) -> Response {
    let [n0, n1, n2] = get_args::<3>(a, input, "modpow takes exactly 3 arguments")?;
    let mut cost = MODPOW_BASE_COST;
    check_cost(cost, max_cost)?;

    let (base, l_base) = int_atom(a, n0, require_minimal(flags), "modpow requires int args")?;
    cost += l_base as Cost * MODPOW_COST_PER_BYTE_BASE_VALUE;
    check_cost(cost, max_cost)?;

    let (exponent, l_exp) = int_atom(a, n1, require_minimal(flags), "modpow requires int args")?;
    if exponent.sign() == Sign::Minus {
        return Err(EvalErr::NegativeExponent(n1));
    }
    cost += l_exp as Cost * MODPOW_COST_PER_BYTE_EXPONENT;
    check_cost(cost, max_cost)?;

    let (modulus, l_mod) = int_atom(a, n2, require_minimal(flags), "modpow requires int args")?;
    if modulus.is_zero() {
        return Err(EvalErr::ModByZero(n2));
    }
    cost += l_mod as Cost * MODPOW_COST_PER_BYTE_MOD;
    check_cost(cost, max_cost)?;

    let m_abs = if modulus.sign() == Sign::Minus {
        -modulus.clone()
    } else {
        modulus.clone()
    };
    let base = ((base % &m_abs) + &m_abs) % &m_abs;
    let mut ret = base.modpow(&exponent, &m_abs);
    // the result takes the modulus's sign convention
    if modulus.sign() == Sign::Minus && !ret.is_zero() {
        ret -= m_abs;
    }
    let ret = a.new_number(ret)?;
    Ok(malloc_cost(a, cost, ret))
}

pub fn op_gr(a: &mut Allocator, input: NodePtr, _max_cost: Cost, flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, "> takes exactly 2 arguments")?;
    let (a0, l0) = int_atom(a, n0, require_minimal(flags), "> requires int args")?;
    let (a1, l1) = int_atom(a, n1, require_minimal(flags), "> requires int args")?;
    let cost = GR_BASE_COST + (l0 as Cost + l1 as Cost) * GR_COST_PER_BYTE;
    let r = if a0 > a1 { a.one() } else { a.nil() };
    Ok(Reduction(cost, r))
}

pub fn op_gr_bytes(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, ">s takes exactly 2 arguments")?;
    let v0 = atom(a, n0, ">s on list")?;
    let v1 = atom(a, n1, ">s on list")?;
    let (b0, b1) = (v0.as_ref(), v1.as_ref());
    let cost = GRS_BASE_COST + (b0.len() as Cost + b1.len() as Cost) * GRS_COST_PER_BYTE;
    let r = if b0 > b1 { a.one() } else { a.nil() };
    Ok(Reduction(cost, r))
}

pub fn op_strlen(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n] = get_args::<1>(a, input, "strlen takes exactly 1 argument")?;
    let size = atom(a, n, "strlen on list")?.as_ref().len();
    let cost = STRLEN_BASE_COST + size as Cost * STRLEN_COST_PER_BYTE;
    let size_node = a.new_number(size.into())?;
    Ok(malloc_cost(a, cost, size_node))
}

pub fn op_substr(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let ac = arg_count(a, input, 3);
    if !(2..=3).contains(&ac) {
        return Err(EvalErr::ArgType(input, "substr takes exactly 2 or 3 arguments"));
    }
    let (n0, rest) = a.pair(input).ok_or(EvalErr::BadOperandList(input))?;
    let size = atom(a, n0, "substr on list")?.as_ref().len() as i64;
    let (n1, rest) = a.pair(rest).ok_or(EvalErr::BadOperandList(rest))?;
    let start = i64::from(i32_atom(a, n1, "substr requires int args")?);
    let end = if ac == 3 {
        let (n2, _) = a.pair(rest).ok_or(EvalErr::BadOperandList(rest))?;
        i64::from(i32_atom(a, n2, "substr requires int args")?)
    } else {
        size
    };
    if start < 0 || end < 0 || start > size || end > size || end < start {
        return Err(EvalErr::InvalidSubstr(input));
    }
    let r = a.new_substr(n0, start as u32, end as u32)?;
    // substr is zero copy, the cost is deliberately nominal
    Ok(Reduction(1, r))
}

pub fn op_concat(a: &mut Allocator, input: NodePtr, max_cost: Cost, _flags: u32) -> Response {
    let mut cost = CONCAT_BASE_COST;
    check_cost(cost, max_cost)?;
    let mut total_size: usize = 0;
    let mut terms = Vec::<NodePtr>::new();
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += CONCAT_COST_PER_ARG;
        check_cost(cost + total_size as Cost * CONCAT_COST_PER_BYTE, max_cost)?;
        if let SExp::Pair(..) = a.sexp(arg) {
            return Err(EvalErr::ArgType(arg, "concat on list"));
        }
        total_size += a.atom_len(arg);
        terms.push(arg);
    }
    cost += total_size as Cost * CONCAT_COST_PER_BYTE;
    check_cost(cost + total_size as Cost * MALLOC_COST_PER_BYTE, max_cost)?;
    let new_atom = a.new_concat(total_size, &terms)?;
    Ok(Reduction(
        cost + total_size as Cost * MALLOC_COST_PER_BYTE,
        new_atom,
    ))
}

pub fn op_ash(a: &mut Allocator, input: NodePtr, _max_cost: Cost, flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, "ash takes exactly 2 arguments")?;
    let (v, l0) = int_atom(a, n0, require_minimal(flags), "ash requires int args")?;
    let shift = i32_atom(a, n1, "ash requires int32 args")?;
    if shift.abs() > SHIFT_LIMIT_BITS {
        return Err(EvalErr::ShiftTooLarge(n1));
    }
    let v = if shift >= 0 {
        v << (shift as usize)
    } else {
        v >> ((-shift) as usize)
    };
    let node = a.new_number(v)?;
    let cost = ASHIFT_BASE_COST + (l0 as Cost + a.atom_len(node) as Cost) * ASHIFT_COST_PER_BYTE;
    Ok(malloc_cost(a, cost, node))
}

pub fn op_lsh(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, "lsh takes exactly 2 arguments")?;
    let b0 = atom(a, n0, "lsh on list")?;
    let l0 = b0.as_ref().len();
    // the value is read as unsigned
    let v = Number::from_bytes_be(Sign::Plus, b0.as_ref());
    let shift = i32_atom(a, n1, "lsh requires int32 args")?;
    if shift.abs() > SHIFT_LIMIT_BITS {
        return Err(EvalErr::ShiftTooLarge(n1));
    }
    let v = if shift >= 0 {
        v << (shift as usize)
    } else {
        v >> ((-shift) as usize)
    };
    let node = a.new_number(v)?;
    let cost = LSHIFT_BASE_COST + (l0 as Cost + a.atom_len(node) as Cost) * LSHIFT_COST_PER_BYTE;
    Ok(malloc_cost(a, cost, node))
}

fn logior_op(total: &mut Number, v: &Number) {
    *total |= v;
}

fn logxor_op(total: &mut Number, v: &Number) {
    *total ^= v;
}

fn logand_op(total: &mut Number, v: &Number) {
    *total &= v;
}

fn binop_reduction(
    op_name: &'static str,
    a: &mut Allocator,
    initial_value: Number,
    input: NodePtr,
    max_cost: Cost,
    flags: u32,
    op_f: fn(&mut Number, &Number),
) -> Response {
    let mut total = initial_value;
    let mut arg_size: usize = 0;
    let mut cost = LOG_BASE_COST;
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += LOG_COST_PER_ARG;
        check_cost(cost + arg_size as Cost * LOG_COST_PER_BYTE, max_cost)?;
        let (n0, len) = int_atom(a, arg, require_minimal(flags), op_name)?;
        op_f(&mut total, &n0);
        arg_size += len;
    }
    cost += arg_size as Cost * LOG_COST_PER_BYTE;
    check_cost(cost, max_cost)?;
    let total = a.new_number(total)?;
    Ok(malloc_cost(a, cost, total))
}

pub fn op_logand(a: &mut Allocator, input: NodePtr, max_cost: Cost, flags: u32) -> Response {
    let v: Number = Number::from(-1);
    binop_reduction("logand requires int args", a, v, input, max_cost, flags, logand_op)
}

pub fn op_logior(a: &mut Allocator, input: NodePtr, max_cost: Cost, flags: u32) -> Response {
    binop_reduction(
        "logior requires int args",
        a,
        Number::zero(),
        input,
        max_cost,
        flags,
        logior_op,
    )
}

pub fn op_logxor(a: &mut Allocator, input: NodePtr, max_cost: Cost, flags: u32) -> Response {
    binop_reduction(
        "logxor requires int args",
        a,
        Number::zero(),
        input,
        max_cost,
        flags,
        logxor_op,
    )
}

pub fn op_lognot(a: &mut Allocator, input: NodePtr, _max_cost: Cost, flags: u32) -> Response {
    let [n0] = get_args::<1>(a, input, "lognot takes exactly 1 argument")?;
    let (v, len) = int_atom(a, n0, require_minimal(flags), "lognot requires int args")?;
    let cost = LOGNOT_BASE_COST + len as Cost * LOGNOT_COST_PER_BYTE;
    let v = !v;
    let node = a.new_number(v)?;
    Ok(malloc_cost(a, cost, node))
}

pub fn op_not(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n] = get_args::<1>(a, input, "not takes exactly 1 argument")?;
    let r = if nullp(a, n) { a.one() } else { a.nil() };
    Ok(Reduction(BOOL_BASE_COST + BOOL_COST_PER_ARG, r))
}

pub fn op_any(a: &mut Allocator, input: NodePtr, max_cost: Cost, _flags: u32) -> Response {
    let mut cost = BOOL_BASE_COST;
    let mut is_any = false;
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += BOOL_COST_PER_ARG;
        check_cost(cost, max_cost)?;
        is_any = is_any || !nullp(a, arg);
    }
    let total = if is_any { a.one() } else { a.nil() };
    Ok(Reduction(cost, total))
}

pub fn op_all(a: &mut Allocator, input: NodePtr, max_cost: Cost, _flags: u32) -> Response {
    let mut cost = BOOL_BASE_COST;
    let mut is_all = true;
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        cost += BOOL_COST_PER_ARG;
        check_cost(cost, max_cost)?;
        is_all = is_all && !nullp(a, arg);
    }
    let total = if is_all { a.one() } else { a.nil() };
    Ok(Reduction(cost, total))
}

pub fn op_point_add(a: &mut Allocator, input: NodePtr, max_cost: Cost, _flags: u32) -> Response {
    let mut cost = POINT_ADD_BASE_COST;
    check_cost(cost, max_cost)?;
    let mut total: G1Projective = G1Projective::identity();
    let mut args = input;
    while let Some((arg, rest)) = a.pair(args) {
        args = rest;
        let point = g1_atom(a, arg)?;
        cost += POINT_ADD_COST_PER_ARG;
        check_cost(cost, max_cost)?;
        total += &point;
    }
    let blob = G1Affine::from(total).to_compressed();
    new_atom_and_cost(a, cost, &blob)
}

pub fn op_pubkey_for_exp(
    a: &mut Allocator,
    input: NodePtr,
    max_cost: Cost,
    flags: u32,
) -> Response {
    let [n0] = get_args::<1>(a, input, "pubkey_for_exp takes exactly 1 argument")?;
    let (v, len) = int_atom(a, n0, require_minimal(flags), "pubkey_for_exp requires int args")?;
    let cost = PUBKEY_BASE_COST + len as Cost * PUBKEY_COST_PER_BYTE;
    check_cost(cost, max_cost)?;
    let scalar = number_to_scalar(mod_group_order(v));
    let point = G1Projective::generator() * scalar;
    let blob = G1Affine::from(point).to_compressed();
    new_atom_and_cost(a, cost, &blob)
}

/// The maximum value of a coin, 2^64 - 1 mojos.
pub const MAX_COIN_AMOUNT: u64 = u64::MAX;

pub fn op_coinid(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [parent, puzzle, amount] = get_args::<3>(a, input, "coinid takes exactly 3 arguments")?;

    if atom(a, parent, "coinid requires atom args")?.as_ref().len() != 32 {
        return Err(EvalErr::ArgSize(parent, "coinid parent coin id is not 32 bytes"));
    }
    if atom(a, puzzle, "coinid requires atom args")?.as_ref().len() != 32 {
        return Err(EvalErr::ArgSize(puzzle, "coinid puzzle hash is not 32 bytes"));
    }
    // the amount must be a canonical unsigned integer no greater than
    // MAX_COIN_AMOUNT; uint_atom enforces all of it
    uint_atom::<8>(a, amount, "coinid invalid amount")?;

    let mut hasher = Sha256::new();
    hasher.update(a.atom(parent).as_ref());
    hasher.update(a.atom(puzzle).as_ref());
    hasher.update(a.atom(amount).as_ref());
    let coin_id = hasher.finalize();
    new_atom_and_cost(a, COINID_COST, &coin_id)
}

/// Unknown (but not reserved) operators are no-ops with a cost derived
/// from the opcode atom itself. The upper bytes are a cost multiplier
/// and the top two bits of the last byte select one of four cost
/// curves. This keeps programs using future soft-forked operators cost
/// accountable on nodes that don't know them yet.
pub fn op_unknown(a: &mut Allocator, o: NodePtr, input: NodePtr, max_cost: Cost) -> Response {
    let op = a.atom(o);
    let b = op.as_ref();

    if b.is_empty() || b.len() > 5 {
        return Err(EvalErr::InvalidOperator(o));
    }
    if b[0] == 0xff {
        return Err(EvalErr::ReservedOperator(o));
    }

    let cost_function = (b[b.len() - 1] & 0xc0) >> 6;
    let cost_multiplier: u64 = {
        let mut v: u64 = 0;
        for byte in &b[0..b.len() - 1] {
            v = (v << 8) | u64::from(*byte);
        }
        v + 1
    };

    let mut cost = match cost_function {
        0 => 1,
        1 => {
            let mut cost = ARITH_BASE_COST;
            let mut byte_count: usize = 0;
            let mut args = input;
            while let Some((arg, rest)) = a.pair(args) {
                args = rest;
                cost += ARITH_COST_PER_ARG;
                check_cost(cost + byte_count as Cost * ARITH_COST_PER_BYTE, max_cost)?;
                byte_count += match a.sexp(arg) {
                    SExp::Atom => a.atom_len(arg),
                    SExp::Pair(..) => {
                        return Err(EvalErr::ArgType(arg, "unknown op on list"));
                    }
                };
            }
            cost + byte_count as Cost * ARITH_COST_PER_BYTE
        }
        2 => {
            let mut cost = MUL_BASE_COST;
            let mut first_iter = true;
            let mut l0: usize = 0;
            let mut args = input;
            while let Some((arg, rest)) = a.pair(args) {
                args = rest;
                let l1 = match a.sexp(arg) {
                    SExp::Atom => a.atom_len(arg),
                    SExp::Pair(..) => {
                        return Err(EvalErr::ArgType(arg, "unknown op on list"));
                    }
                };
                if first_iter {
                    l0 = l1;
                    first_iter = false;
                    continue;
                }
                cost += MUL_COST_PER_OP
                    + (l0 as Cost + l1 as Cost) * MUL_LINEAR_COST_PER_BYTE
                    + (l0 as Cost * l1 as Cost) / MUL_SQUARE_COST_PER_BYTE_DIVIDER;
                check_cost(cost, max_cost)?;
                l0 += l1;
            }
            cost
        }
        _ => {
            let mut cost = CONCAT_BASE_COST;
            let mut total_size: usize = 0;
            let mut args = input;
            while let Some((arg, rest)) = a.pair(args) {
                args = rest;
                cost += CONCAT_COST_PER_ARG;
                check_cost(cost + total_size as Cost * CONCAT_COST_PER_BYTE, max_cost)?;
                total_size += match a.sexp(arg) {
                    SExp::Atom => a.atom_len(arg),
                    SExp::Pair(..) => {
                        return Err(EvalErr::ArgType(arg, "unknown op on list"));
                    }
                };
            }
            cost + total_size as Cost * CONCAT_COST_PER_BYTE
        }
    };

    check_cost(cost, max_cost)?;
    cost *= cost_multiplier;
    if cost > u64::from(u32::MAX) {
        return Err(EvalErr::InvalidOperator(o));
    }
    check_cost(cost, max_cost)?;
    Ok(Reduction(cost, a.nil()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rstest::rstest;

    fn list(a: &mut Allocator, items: &[NodePtr]) -> NodePtr {
        let mut ret = a.nil();
        for n in items.iter().rev() {
            ret = a.new_pair(*n, ret).unwrap();
        }
        ret
    }

    fn int_list(a: &mut Allocator, values: &[i64]) -> NodePtr {
        let nodes: Vec<NodePtr> = values
            .iter()
            .map(|v| a.new_number(Number::from(*v)).unwrap())
            .collect();
        list(a, &nodes)
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&[42], 42)]
    #[case(&[100, -30, 7], 77)]
    #[case(&[-1, -1], -2)]
    fn test_add(#[case] args: &[i64], #[case] expect: i64) {
        let mut a = Allocator::new();
        let args = int_list(&mut a, args);
        let Reduction(_, r) = op_add(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), expect.into());
    }

    #[test]
    fn test_add_overflows_into_bignum() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[i64::MAX, i64::MAX]);
        let Reduction(_, r) = op_add(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), Number::from(i64::MAX) * 2);
    }

    #[test]
    fn test_subtract() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[100, 30, 7]);
        let Reduction(_, r) = op_subtract(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 63.into());

        // no arguments is the identity
        let nil = a.nil();
        let Reduction(_, r) = op_subtract(&mut a, nil, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 0.into());
    }

    #[test]
    fn test_multiply() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[6, -7, 2]);
        let Reduction(_, r) = op_multiply(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), Number::from(-84));

        // empty product is 1
        let nil = a.nil();
        let Reduction(_, r) = op_multiply(&mut a, nil, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 1.into());
    }

    #[test]
    fn test_minimal_int_enforcement() {
        let mut a = Allocator::new();
        let redundant = a.new_atom(&[0x00, 0x01]).unwrap();
        let args = list(&mut a, &[redundant]);
        // accepted by default
        let Reduction(_, r) = op_add(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 1.into());
        // rejected when the flag demands canonical ints
        assert!(op_add(&mut a, args, Cost::MAX, REQUIRE_MINIMAL_INTS).is_err());
    }

    #[rstest]
    #[case(7, 2, 3, 1)]
    #[case(-7, 2, -4, 1)]
    #[case(7, -2, -4, -1)]
    #[case(-7, -2, 3, -1)]
    #[case(6, 2, 3, 0)]
    #[case(-6, 2, -3, 0)]
    #[case(0, 5, 0, 0)]
    fn test_division_rounds_toward_negative_infinity(
        #[case] n: i64,
        #[case] d: i64,
        #[case] q: i64,
        #[case] rem: i64,
    ) {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[n, d]);

        let Reduction(_, r) = op_div(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), q.into());

        let Reduction(_, r) = op_mod(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), rem.into());

        let Reduction(_, r) = op_divmod(&mut a, args, Cost::MAX, 0).unwrap();
        let (qn, rn) = a.pair(r).unwrap();
        assert_eq!(a.number(qn), q.into());
        assert_eq!(a.number(rn), rem.into());
    }

    #[test]
    fn test_division_by_zero() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[7, 0]);
        assert!(matches!(
            op_div(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::DivByZero(_))
        ));
        assert!(matches!(
            op_divmod(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::DivByZero(_))
        ));
        assert!(matches!(
            op_mod(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::DivByZero(_))
        ));
    }

    #[rstest]
    #[case(2, 10, 1000, 24)]
    #[case(2, 3, 5, 3)]
    #[case(2, 3, -5, -2)]
    #[case(-2, 3, 5, 2)]
    #[case(5, 0, 7, 1)]
    fn test_modpow(#[case] b: i64, #[case] e: i64, #[case] m: i64, #[case] expect: i64) {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[b, e, m]);
        let Reduction(_, r) = op_modpow(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), expect.into());
    }

    #[test]
    fn test_modpow_errors() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[2, -1, 5]);
        assert!(matches!(
            op_modpow(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::NegativeExponent(_))
        ));
        let args = int_list(&mut a, &[2, 3, 0]);
        assert!(matches!(
            op_modpow(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::ModByZero(_))
        ));
    }

    #[rstest]
    #[case(1, 8, 256)]
    #[case(256, -8, 1)]
    #[case(-1, -1, -1)] // arithmetic shift keeps the sign
    #[case(-128, -1, -64)]
    #[case(7, 0, 7)]
    fn test_ash(#[case] v: i64, #[case] shift: i64, #[case] expect: i64) {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[v, shift]);
        let Reduction(_, r) = op_ash(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), expect.into());
    }

    #[test]
    fn test_lsh_is_unsigned() {
        let mut a = Allocator::new();
        // 0x80 reads as 128, not -128
        let v = a.new_atom(&[0x80]).unwrap();
        let one = a.one();
        let args = list(&mut a, &[v, one]);
        let Reduction(_, r) = op_lsh(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 256.into());

        let minus_one = a.new_number(Number::from(-1)).unwrap();
        let args = list(&mut a, &[v, minus_one]);
        let Reduction(_, r) = op_lsh(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 64.into());
    }

    #[rstest]
    #[case(65536)]
    #[case(-65536)]
    fn test_shift_limit(#[case] shift: i64) {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[1, shift]);
        assert!(matches!(
            op_ash(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::ShiftTooLarge(_))
        ));
        assert!(matches!(
            op_lsh(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::ShiftTooLarge(_))
        ));
    }

    #[test]
    fn test_shift_at_limit_is_allowed() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[1, 65535]);
        let Reduction(_, r) = op_ash(&mut a, args, Cost::MAX, 0).unwrap();
        // 2^65535 needs 65537 bits in two's complement
        assert_eq!(a.atom_len(r), 8193);
    }

    #[test]
    fn test_logic_ops() {
        let mut a = Allocator::new();

        let args = int_list(&mut a, &[12, 10]);
        let Reduction(_, r) = op_logand(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 8.into());

        let args = int_list(&mut a, &[4, 1]);
        let Reduction(_, r) = op_logior(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 5.into());

        let args = int_list(&mut a, &[5, 3]);
        let Reduction(_, r) = op_logxor(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 6.into());

        // identities
        let nil = a.nil();
        let Reduction(_, r) = op_logand(&mut a, nil, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), Number::from(-1));
        let Reduction(_, r) = op_logior(&mut a, nil, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 0.into());

        let args = int_list(&mut a, &[0]);
        let Reduction(_, r) = op_lognot(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), Number::from(-1));
    }

    #[test]
    fn test_bool_ops() {
        let mut a = Allocator::new();

        let args = int_list(&mut a, &[0]);
        let Reduction(_, r) = op_not(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.one());

        let args = int_list(&mut a, &[0, 1]);
        let Reduction(_, r) = op_any(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.one());
        let Reduction(_, r) = op_all(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.nil());

        // empty lists: any of nothing is false, all of nothing is true
        let nil = a.nil();
        let Reduction(_, r) = op_any(&mut a, nil, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.nil());
        let Reduction(_, r) = op_all(&mut a, nil, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.one());
    }

    #[test]
    fn test_gr() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[300, 2]);
        let Reduction(_, r) = op_gr(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.one());

        let args = int_list(&mut a, &[-300, 2]);
        let Reduction(_, r) = op_gr(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.nil());
    }

    #[test]
    fn test_gr_bytes() {
        let mut a = Allocator::new();
        let foo = a.new_atom(b"foo").unwrap();
        let fop = a.new_atom(b"fop").unwrap();
        let args = list(&mut a, &[fop, foo]);
        let Reduction(_, r) = op_gr_bytes(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.one());

        // unsigned comparison: 0x80 sorts above 0x7f
        let hi = a.new_atom(&[0x80]).unwrap();
        let lo = a.new_atom(&[0x7f]).unwrap();
        let args = list(&mut a, &[hi, lo]);
        let Reduction(_, r) = op_gr_bytes(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(r, a.one());
    }

    #[test]
    fn test_strlen() {
        let mut a = Allocator::new();
        let s = a.new_atom(b"foobar").unwrap();
        let args = list(&mut a, &[s]);
        let Reduction(cost, r) = op_strlen(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.number(r), 6.into());
        assert_eq!(cost, STRLEN_BASE_COST + 6 + MALLOC_COST_PER_BYTE);
    }

    #[rstest]
    #[case(3, None, b"bar")]
    #[case(0, None, b"foobar")]
    #[case(6, None, b"")]
    #[case(1, Some(4), b"oob")]
    #[case(2, Some(2), b"")]
    fn test_substr(#[case] start: i64, #[case] end: Option<i64>, #[case] expect: &[u8]) {
        let mut a = Allocator::new();
        let s = a.new_atom(b"foobar").unwrap();
        let mut nodes = vec![s, a.new_number(start.into()).unwrap()];
        if let Some(end) = end {
            nodes.push(a.new_number(end.into()).unwrap());
        }
        let args = list(&mut a, &nodes);
        let Reduction(cost, r) = op_substr(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(cost, 1);
        assert_eq!(a.atom(r).as_ref(), expect);
    }

    #[rstest]
    #[case(7, None)]
    #[case(-1, None)]
    #[case(1, Some(7))]
    #[case(4, Some(2))]
    #[case(0, Some(-1))]
    fn test_substr_out_of_range(#[case] start: i64, #[case] end: Option<i64>) {
        let mut a = Allocator::new();
        let s = a.new_atom(b"foobar").unwrap();
        let mut nodes = vec![s, a.new_number(start.into()).unwrap()];
        if let Some(end) = end {
            nodes.push(a.new_number(end.into()).unwrap());
        }
        let args = list(&mut a, &nodes);
        assert!(matches!(
            op_substr(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::InvalidSubstr(_))
        ));
    }

    #[test]
    fn test_concat() {
        let mut a = Allocator::new();
        let foo = a.new_atom(b"foo").unwrap();
        let bar = a.new_atom(b"bar").unwrap();
        let args = list(&mut a, &[foo, bar]);
        let Reduction(_, r) = op_concat(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(a.atom(r).as_ref(), b"foobar");

        let p = a.new_pair(foo, bar).unwrap();
        let args = list(&mut a, &[foo, p]);
        assert!(matches!(
            op_concat(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::ArgType(..))
        ));
    }

    #[test]
    fn test_sha256() {
        let mut a = Allocator::new();
        let foo = a.new_atom(b"foo").unwrap();
        let bar = a.new_atom(b"bar").unwrap();
        // hashes the concatenation of all arguments
        let args = list(&mut a, &[foo, bar]);
        let Reduction(_, r) = op_sha256(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(
            a.atom(r).as_ref(),
            hex!("c3ab8ff13720e8ad9047dd39466b3c8974e592c2fa383d4a3960714caef0c4f2")
        );
    }

    #[test]
    fn test_keccak256() {
        let mut a = Allocator::new();
        let nil = a.nil();
        let Reduction(_, r) = op_keccak256(&mut a, nil, Cost::MAX, 0).unwrap();
        assert_eq!(
            a.atom(r).as_ref(),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );

        let foobar = a.new_atom(b"foobar").unwrap();
        let args = list(&mut a, &[foobar]);
        let Reduction(_, r) = op_keccak256(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(
            a.atom(r).as_ref(),
            hex!("38d18acb67d25c8bb9942764b62f18e17054f66a817bd4295423adf9ed98873e")
        );
    }

    #[test]
    fn test_point_add() {
        use group::Group;
        let mut a = Allocator::new();
        let gen = a
            .new_atom(&G1Affine::generator().to_compressed())
            .unwrap();
        let args = list(&mut a, &[gen, gen]);
        let Reduction(_, r) = op_point_add(&mut a, args, Cost::MAX, 0).unwrap();
        let expect = G1Affine::from(G1Projective::generator().double()).to_compressed();
        assert_eq!(a.atom(r).as_ref(), expect);
    }

    #[test]
    fn test_pubkey_for_exp() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[1]);
        let Reduction(_, r) = op_pubkey_for_exp(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(
            a.atom(r).as_ref(),
            G1Affine::generator().to_compressed()
        );

        // the exponent is reduced mod the group order: -1 * G == -G
        let args = int_list(&mut a, &[-1]);
        let Reduction(_, r) = op_pubkey_for_exp(&mut a, args, Cost::MAX, 0).unwrap();
        let expect = G1Affine::from(-G1Projective::generator()).to_compressed();
        assert_eq!(a.atom(r).as_ref(), expect);
    }

    #[test]
    fn test_coinid() {
        let mut a = Allocator::new();
        let parent = a.new_atom(&[1; 32]).unwrap();
        let puzzle = a.new_atom(&[2; 32]).unwrap();
        let amount = a.new_number(1000.into()).unwrap();
        let args = list(&mut a, &[parent, puzzle, amount]);
        let Reduction(cost, r) = op_coinid(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(cost, COINID_COST + 32 * MALLOC_COST_PER_BYTE);
        assert_eq!(
            a.atom(r).as_ref(),
            hex!("aad58c47f39d4490b13c9e1eb3908a4818c57a8fdac68357da0a4673e69ccce9")
        );
    }

    #[test]
    fn test_coinid_rejects_malformed() {
        let mut a = Allocator::new();
        let parent = a.new_atom(&[1; 32]).unwrap();
        let short = a.new_atom(&[2; 31]).unwrap();
        let amount = a.new_number(1000.into()).unwrap();

        let args = list(&mut a, &[parent, short, amount]);
        assert!(matches!(
            op_coinid(&mut a, args, Cost::MAX, 0),
            Err(EvalErr::ArgSize(..))
        ));

        // negative amounts are rejected
        let neg = a.new_number(Number::from(-1)).unwrap();
        let args = list(&mut a, &[parent, parent, neg]);
        assert!(op_coinid(&mut a, args, Cost::MAX, 0).is_err());

        // amounts beyond 2^64 - 1 are rejected
        let big = a.new_number(Number::from(u64::MAX) + 1).unwrap();
        let args = list(&mut a, &[parent, parent, big]);
        assert!(op_coinid(&mut a, args, Cost::MAX, 0).is_err());

        // redundant leading zero bytes are rejected
        let padded = a.new_atom(&[0x00, 0x01]).unwrap();
        let args = list(&mut a, &[parent, parent, padded]);
        assert!(op_coinid(&mut a, args, Cost::MAX, 0).is_err());
    }

    #[test]
    fn test_op_costs_are_reproducible() {
        let mut a = Allocator::new();
        let args = int_list(&mut a, &[123456, -654321, 42]);
        let Reduction(c1, _) = op_add(&mut a, args, Cost::MAX, 0).unwrap();
        let Reduction(c2, _) = op_add(&mut a, args, Cost::MAX, 0).unwrap();
        assert_eq!(c1, c2);
    }
}
