use crate::allocator::{Allocator, NodePtr, SExp};
use crate::cost::Cost;
use crate::error::EvalErr;
use crate::op_utils::{atom, get_args, nullp};
use crate::reduction::{Reduction, Response};

const FIRST_COST: Cost = 30;
const IF_COST: Cost = 33;
const CONS_COST: Cost = 50;
const REST_COST: Cost = 30;
const LISTP_COST: Cost = 19;
const EQ_BASE_COST: Cost = 117;
const EQ_COST_PER_BYTE: Cost = 1;

pub fn op_if(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [cond, affirmative, negative] = get_args::<3>(a, input, "i takes exactly 3 arguments")?;
    let chosen = if nullp(a, cond) { negative } else { affirmative };
    Ok(Reduction(IF_COST, chosen))
}

pub fn op_cons(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n1, n2] = get_args::<2>(a, input, "c takes exactly 2 arguments")?;
    let r = a.new_pair(n1, n2)?;
    Ok(Reduction(CONS_COST, r))
}

pub fn op_first(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n] = get_args::<1>(a, input, "f takes exactly 1 argument")?;
    match a.sexp(n) {
        SExp::Pair(first, _) => Ok(Reduction(FIRST_COST, first)),
        SExp::Atom => Err(EvalErr::FirstOfNonCons(n)),
    }
}

pub fn op_rest(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n] = get_args::<1>(a, input, "r takes exactly 1 argument")?;
    match a.sexp(n) {
        SExp::Pair(_, rest) => Ok(Reduction(REST_COST, rest)),
        SExp::Atom => Err(EvalErr::RestOfNonCons(n)),
    }
}

pub fn op_listp(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n] = get_args::<1>(a, input, "l takes exactly 1 argument")?;
    match a.sexp(n) {
        SExp::Pair(..) => Ok(Reduction(LISTP_COST, a.one())),
        SExp::Atom => Ok(Reduction(LISTP_COST, a.nil())),
    }
}

pub fn op_raise(_a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    // the evaluated argument list is the user's error payload
    Err(EvalErr::ClvmRaise(input))
}

pub fn op_eq(a: &mut Allocator, input: NodePtr, _max_cost: Cost, _flags: u32) -> Response {
    let [n0, n1] = get_args::<2>(a, input, "= takes exactly 2 arguments")?;
    let len0 = atom(a, n0, "= on list")?.as_ref().len();
    let len1 = atom(a, n1, "= on list")?.as_ref().len();
    let cost = EQ_BASE_COST + (len0 as Cost + len1 as Cost) * EQ_COST_PER_BYTE;
    let r = if a.atom_eq(n0, n1) { a.one() } else { a.nil() };
    Ok(Reduction(cost, r))
}
