use crate::allocator::{Allocator, Atom, NodePtr, SExp};
use crate::cost::Cost;
use crate::error::EvalErr;
use crate::number::{is_canonical_integer, Number};
use crate::reduction::{Reduction, Response};
use hex_literal::hex;
use lazy_static::lazy_static;
use num_bigint::Sign;

pub const MALLOC_COST_PER_BYTE: Cost = 10;

pub fn nullp(a: &Allocator, n: NodePtr) -> bool {
    match a.sexp(n) {
        SExp::Atom => a.atom_len(n) == 0,
        SExp::Pair(..) => false,
    }
}

pub fn first(a: &Allocator, n: NodePtr) -> Result<NodePtr, EvalErr> {
    match a.sexp(n) {
        SExp::Pair(first, _) => Ok(first),
        SExp::Atom => Err(EvalErr::FirstOfNonCons(n)),
    }
}

pub fn rest(a: &Allocator, n: NodePtr) -> Result<NodePtr, EvalErr> {
    match a.sexp(n) {
        SExp::Pair(_, rest) => Ok(rest),
        SExp::Atom => Err(EvalErr::RestOfNonCons(n)),
    }
}

pub fn atom<'a>(a: &'a Allocator, n: NodePtr, err: &'static str) -> Result<Atom<'a>, EvalErr> {
    match a.sexp(n) {
        SExp::Atom => Ok(a.atom(n)),
        SExp::Pair(..) => Err(EvalErr::ArgType(n, err)),
    }
}

/// Unpack a proper list of exactly N elements. The error message names
/// the operator and the expected count.
pub fn get_args<const N: usize>(
    a: &Allocator,
    args: NodePtr,
    err: &'static str,
) -> Result<[NodePtr; N], EvalErr> {
    let mut ret = [NodePtr::NIL; N];
    let mut counter = 0;
    let mut cur = args;
    while let Some((f, r)) = a.pair(cur) {
        if counter == N {
            return Err(EvalErr::ArgType(args, err));
        }
        ret[counter] = f;
        counter += 1;
        cur = r;
    }
    if counter != N || !nullp(a, cur) {
        return Err(EvalErr::ArgType(args, err));
    }
    Ok(ret)
}

/// Number of elements in a (proper) argument list, stopping early at
/// `limit + 1` so hostile lists don't cost a full walk.
pub fn arg_count(a: &Allocator, args: NodePtr, limit: usize) -> usize {
    let mut count = 0;
    let mut cur = args;
    while let Some((_, r)) = a.pair(cur) {
        count += 1;
        if count > limit {
            break;
        }
        cur = r;
    }
    count
}

/// Read an atom as a signed big integer, returning the value and the
/// encoded length (the length feeds per-byte costs). Minimal encoding is
/// only demanded when the run's flags say so.
pub fn int_atom(
    a: &Allocator,
    n: NodePtr,
    require_minimal: bool,
    err: &'static str,
) -> Result<(Number, usize), EvalErr> {
    match a.sexp(n) {
        SExp::Pair(..) => Err(EvalErr::ArgType(n, err)),
        SExp::Atom => {
            if require_minimal && !is_canonical_integer(a.atom(n).as_ref()) {
                return Err(EvalErr::ArgType(n, err));
            }
            Ok((a.number(n), a.atom_len(n)))
        }
    }
}

pub fn u64_from_bytes(v: &[u8]) -> u64 {
    debug_assert!(v.len() <= 8);
    let mut ret: u64 = 0;
    for b in v {
        ret = (ret << 8) | u64::from(*b);
    }
    ret
}

/// Read an atom as a canonically encoded unsigned integer of at most
/// `SIZE` bytes of magnitude. Used where exact widths are part of the
/// protocol (coin amounts, declared softfork costs).
pub fn uint_atom<const SIZE: usize>(
    a: &Allocator,
    n: NodePtr,
    err: &'static str,
) -> Result<u64, EvalErr> {
    debug_assert!(SIZE <= 8);
    let atom = atom(a, n, err)?;
    let bytes = atom.as_ref();
    if bytes.is_empty() {
        return Ok(0);
    }
    if bytes[0] & 0x80 != 0 {
        return Err(EvalErr::ArgType(n, err));
    }
    if !is_canonical_integer(bytes) {
        return Err(EvalErr::ArgType(n, err));
    }
    // a canonical positive value may carry one 0x00 pad byte
    let magnitude = if bytes[0] == 0 { &bytes[1..] } else { bytes };
    if magnitude.len() > SIZE {
        return Err(EvalErr::ArgSize(n, err));
    }
    Ok(u64_from_bytes(magnitude))
}

/// Read an atom as a signed 32 bit value (at most 4 bytes). Shift counts
/// use this.
pub fn i32_atom(a: &Allocator, n: NodePtr, err: &'static str) -> Result<i32, EvalErr> {
    let atom = atom(a, n, err)?;
    let bytes = atom.as_ref();
    if bytes.len() > 4 {
        return Err(EvalErr::ArgSize(n, err));
    }
    let mut buf = [0_u8; 4];
    buf[4 - bytes.len()..].copy_from_slice(bytes);
    let mut val = i32::from_be_bytes(buf);
    if !bytes.is_empty() && bytes[0] & 0x80 != 0 {
        // sign-extend
        let shift = 32 - 8 * bytes.len() as u32;
        val = (val << shift) >> shift;
    }
    Ok(val)
}

pub fn malloc_cost(a: &Allocator, cost: Cost, node: NodePtr) -> Reduction {
    Reduction(cost + a.atom_len(node) as Cost * MALLOC_COST_PER_BYTE, node)
}

pub fn new_atom_and_cost(a: &mut Allocator, cost: Cost, buf: &[u8]) -> Response {
    let node = a.new_atom(buf)?;
    Ok(Reduction(
        cost + buf.len() as Cost * MALLOC_COST_PER_BYTE,
        node,
    ))
}

lazy_static! {
    // the BLS12-381 scalar field order r
    static ref GROUP_ORDER: Number = Number::from_bytes_be(
        Sign::Plus,
        &hex!("73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001"),
    );
}

pub fn mod_group_order(n: Number) -> Number {
    let order = &*GROUP_ORDER;
    let mut n = n % order;
    if n.sign() == Sign::Minus {
        n += order;
    }
    n
}

/// Convert a value already reduced into [0, r) to a scalar.
pub fn number_to_scalar(n: Number) -> bls12_381::Scalar {
    debug_assert!(n.sign() != Sign::Minus);
    let (_, bytes_be) = n.to_bytes_be();
    debug_assert!(bytes_be.len() <= 32);
    let mut le = [0_u8; 32];
    for (i, b) in bytes_be.iter().rev().enumerate() {
        le[i] = *b;
    }
    bls12_381::Scalar::from_bytes(&le).unwrap()
}
