use super::parse_atom::decode_size;
use crate::allocator::{Allocator, NodePtr};
use crate::error::EvalErr;

enum ParseOp {
    SExp,
    Cons,
}

/// Deserialize a node from a prefix of the byte stream, returning the
/// node and the number of bytes consumed. Trailing bytes are the
/// caller's business.
pub fn node_from_bytes_consumed(
    a: &mut Allocator,
    b: &[u8],
) -> Result<(NodePtr, usize), EvalErr> {
    let mut cursor: usize = 0;
    let mut ops = vec![ParseOp::SExp];
    let mut vals = Vec::<NodePtr>::new();

    while let Some(op) = ops.pop() {
        match op {
            ParseOp::SExp => {
                let byte = *b.get(cursor).ok_or(EvalErr::BadEncoding)?;
                if byte == 0xff {
                    cursor += 1;
                    ops.push(ParseOp::Cons);
                    ops.push(ParseOp::SExp);
                    ops.push(ParseOp::SExp);
                } else {
                    let (prefix_len, size) = decode_size(b, cursor)?;
                    let start = cursor + prefix_len;
                    let end = start
                        .checked_add(size as usize)
                        .ok_or(EvalErr::BadEncoding)?;
                    if end > b.len() {
                        return Err(EvalErr::BadEncoding);
                    }
                    vals.push(a.new_atom(&b[start..end])?);
                    cursor = end;
                }
            }
            ParseOp::Cons => {
                // the right child was parsed last
                let rest = vals.pop().ok_or(EvalErr::BadEncoding)?;
                let first = vals.pop().ok_or(EvalErr::BadEncoding)?;
                vals.push(a.new_pair(first, rest)?);
            }
        }
    }

    match vals.pop() {
        Some(root) => Ok((root, cursor)),
        None => Err(EvalErr::BadEncoding),
    }
}

/// Deserialize a node, requiring the input to be consumed exactly.
pub fn node_from_bytes(a: &mut Allocator, b: &[u8]) -> Result<NodePtr, EvalErr> {
    let (node, consumed) = node_from_bytes_consumed(a, b)?;
    if consumed != b.len() {
        return Err(EvalErr::Trailing);
    }
    Ok(node)
}
