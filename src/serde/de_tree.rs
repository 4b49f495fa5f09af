use super::parse_atom::decode_size;
use crate::error::EvalErr;
use crate::tree_hash::{tree_hash_atom, tree_hash_pair, TreeHash};

/// One node of an indexed parse, in pre-order. `start..end` is the byte
/// range of the node's complete serialization, so re-serializing any
/// subtree is a slice copy. For atoms, `atom_offset` is where the
/// payload begins within the range; for pairs, `right_index` is the
/// pre-order index of the right child (the left child is always the
/// next index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTriple {
    Atom {
        start: u64,
        end: u64,
        atom_offset: u32,
    },
    Pair {
        start: u64,
        end: u64,
        right_index: u32,
    },
}

/// The serialized form of the subtree at pre-order `index`, as a slice
/// of the original buffer. Re-serializing a subtree never needs a tree
/// walk.
pub fn subtree_bytes<'a>(b: &'a [u8], triples: &[ParsedTriple], index: usize) -> &'a [u8] {
    let (start, end) = match triples[index] {
        ParsedTriple::Atom { start, end, .. } | ParsedTriple::Pair { start, end, .. } => {
            (start, end)
        }
    };
    &b[start as usize..end as usize]
}

enum ParseOp {
    SExp,
    SaveEnd(usize),
    SaveRightIndex(usize),
}

/// Parse a serialized node into indexed triples, optionally computing
/// every subtree's tree hash in the same pass. No nodes are allocated.
pub fn parse_triples(
    b: &[u8],
    calculate_tree_hashes: bool,
) -> Result<(Vec<ParsedTriple>, Option<Vec<TreeHash>>), EvalErr> {
    let mut triples = Vec::<ParsedTriple>::new();
    let mut hashes = Vec::<TreeHash>::new();
    let mut ops = vec![ParseOp::SExp];
    let mut cursor: usize = 0;

    while let Some(op) = ops.pop() {
        match op {
            ParseOp::SExp => {
                let byte = *b.get(cursor).ok_or(EvalErr::BadEncoding)?;
                if byte == 0xff {
                    let index = triples.len();
                    triples.push(ParsedTriple::Pair {
                        start: cursor as u64,
                        end: 0,
                        right_index: 0,
                    });
                    if calculate_tree_hashes {
                        hashes.push(TreeHash::default());
                    }
                    cursor += 1;
                    ops.push(ParseOp::SaveEnd(index));
                    ops.push(ParseOp::SExp);
                    ops.push(ParseOp::SaveRightIndex(index));
                    ops.push(ParseOp::SExp);
                } else {
                    let (prefix_len, size) = decode_size(b, cursor)?;
                    let start = cursor;
                    let end = start
                        .checked_add(prefix_len)
                        .and_then(|c| c.checked_add(size as usize))
                        .ok_or(EvalErr::BadEncoding)?;
                    if end > b.len() {
                        return Err(EvalErr::BadEncoding);
                    }
                    if calculate_tree_hashes {
                        hashes.push(tree_hash_atom(&b[start + prefix_len..end]));
                    }
                    triples.push(ParsedTriple::Atom {
                        start: start as u64,
                        end: end as u64,
                        atom_offset: prefix_len as u32,
                    });
                    cursor = end;
                }
            }
            ParseOp::SaveRightIndex(index) => {
                let right = triples.len() as u32;
                if let ParsedTriple::Pair { right_index, .. } = &mut triples[index] {
                    *right_index = right;
                } else {
                    return Err(EvalErr::InternalError(
                        crate::allocator::NodePtr::NIL,
                        "indexed parse stack corrupt",
                    ));
                }
            }
            ParseOp::SaveEnd(index) => {
                let ParsedTriple::Pair { end, right_index, .. } = &mut triples[index] else {
                    return Err(EvalErr::InternalError(
                        crate::allocator::NodePtr::NIL,
                        "indexed parse stack corrupt",
                    ));
                };
                *end = cursor as u64;
                if calculate_tree_hashes {
                    let right = *right_index as usize;
                    hashes[index] = tree_hash_pair(hashes[index + 1], hashes[right]);
                }
            }
        }
    }

    Ok((
        triples,
        if calculate_tree_hashes {
            Some(hashes)
        } else {
            None
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::Allocator;
    use crate::serde::de::node_from_bytes;
    use crate::serde::ser::node_to_bytes;
    use crate::tree_hash::tree_hash;
    use hex_literal::hex;

    #[test]
    fn test_single_atom() {
        let (triples, hashes) = parse_triples(&hex!("83666f6f"), true).unwrap();
        assert_eq!(
            triples,
            vec![ParsedTriple::Atom {
                start: 0,
                end: 4,
                atom_offset: 1
            }]
        );
        assert_eq!(hashes.unwrap()[0], tree_hash_atom(b"foo"));
    }

    #[test]
    fn test_one_byte_atom_has_no_prefix() {
        let (triples, _) = parse_triples(&hex!("42"), false).unwrap();
        assert_eq!(
            triples,
            vec![ParsedTriple::Atom {
                start: 0,
                end: 1,
                atom_offset: 0
            }]
        );
    }

    #[test]
    fn test_list_layout() {
        // (1 2) == ff 01 ff 02 80
        let (triples, _) = parse_triples(&hex!("ff01ff0280"), false).unwrap();
        assert_eq!(
            triples,
            vec![
                ParsedTriple::Pair {
                    start: 0,
                    end: 5,
                    right_index: 2
                },
                ParsedTriple::Atom {
                    start: 1,
                    end: 2,
                    atom_offset: 0
                },
                ParsedTriple::Pair {
                    start: 2,
                    end: 5,
                    right_index: 4
                },
                ParsedTriple::Atom {
                    start: 3,
                    end: 4,
                    atom_offset: 0
                },
                ParsedTriple::Atom {
                    start: 4,
                    end: 5,
                    atom_offset: 1
                },
            ]
        );
    }

    #[test]
    fn test_subtree_ranges_reserialize() {
        let bytes = hex!("ff83666f6fff83626172ff8362617a80");
        let (triples, _) = parse_triples(&bytes, false).unwrap();

        // every subtree's range re-serializes to exactly the bytes a
        // fresh serialization would produce
        for i in 0..triples.len() {
            let slice = subtree_bytes(&bytes, &triples, i);
            let mut a = Allocator::new();
            let node = node_from_bytes(&mut a, slice).unwrap();
            assert_eq!(node_to_bytes(&a, node).unwrap(), slice, "subtree {i}");
        }
    }

    #[test]
    fn test_hash_pass_matches_tree_hash() {
        let bytes = hex!("ff02ffff0101ff0180");
        let (_, hashes) = parse_triples(&bytes, true).unwrap();
        let hashes = hashes.unwrap();

        let mut a = Allocator::new();
        let node = node_from_bytes(&mut a, &bytes).unwrap();
        assert_eq!(hashes[0], tree_hash(&a, node));
    }

    #[test]
    fn test_truncated() {
        assert_eq!(
            parse_triples(&hex!("ff01"), false),
            Err(EvalErr::BadEncoding)
        );
    }

    #[test]
    fn test_deep_spine() {
        let mut b = vec![0xff_u8; 200_000];
        b.push(0x80);
        b.extend(std::iter::repeat(0x80).take(200_000));
        let (triples, hashes) = parse_triples(&b, true).unwrap();
        assert_eq!(triples.len(), 400_001);
        assert_eq!(hashes.unwrap().len(), 400_001);
    }
}
