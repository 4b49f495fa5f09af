use crate::allocator::{Allocator, NodePtr, SExp};
use crate::error::EvalErr;

/// Append the canonical encoding of an atom: one-byte atoms at or below
/// 0x7f encode as themselves, the empty atom is 0x80, everything else
/// gets the smallest size prefix that fits.
pub(crate) fn write_atom(out: &mut Vec<u8>, atom: &[u8]) {
    let size = atom.len() as u64;
    if size == 0 {
        out.push(0x80);
        return;
    }
    if size == 1 && atom[0] <= 0x7f {
        out.push(atom[0]);
        return;
    }
    if size < 0x40 {
        out.push(0x80 | size as u8);
    } else if size < 0x2000 {
        out.push(0xc0 | (size >> 8) as u8);
        out.push(size as u8);
    } else if size < 0x10_0000 {
        out.push(0xe0 | (size >> 16) as u8);
        out.push((size >> 8) as u8);
        out.push(size as u8);
    } else if size < 0x800_0000 {
        out.push(0xf0 | (size >> 24) as u8);
        out.push((size >> 16) as u8);
        out.push((size >> 8) as u8);
        out.push(size as u8);
    } else {
        // atoms cap at 2^32 - 1, which always fits the five byte form
        out.push(0xf8 | (size >> 32) as u8);
        out.push((size >> 24) as u8);
        out.push((size >> 16) as u8);
        out.push((size >> 8) as u8);
        out.push(size as u8);
    }
    out.extend_from_slice(atom);
}

/// Serialize a node to its canonical byte form. Iterative; arbitrarily
/// deep trees are fine.
pub fn node_to_bytes(a: &Allocator, node: NodePtr) -> Result<Vec<u8>, EvalErr> {
    let mut out = Vec::<u8>::new();
    let mut todo = vec![node];

    while let Some(n) = todo.pop() {
        match a.sexp(n) {
            SExp::Pair(first, rest) => {
                out.push(0xff);
                todo.push(rest);
                todo.push(first);
            }
            SExp::Atom => {
                write_atom(&mut out, a.atom(n).as_ref());
            }
        }
    }
    Ok(out)
}
