use crate::allocator::{Allocator, NodePtr, ObjectType, SExp};
use crate::error::EvalErr;
use crate::serde::parse_triples;
use clvm_sha2::Sha256;
use hex_literal::hex;
use std::collections::HashMap;
use std::fmt;

/// sha256(1 || atom) for leaves, sha256(2 || left || right) for pairs.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeHash([u8; 32]);

impl TreeHash {
    pub const fn new(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for TreeHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TreeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TreeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TreeHash").field(&hex::encode(self.0)).finish()
    }
}

pub fn tree_hash_atom(bytes: &[u8]) -> TreeHash {
    let mut sha256 = Sha256::new();
    sha256.update([1]);
    sha256.update(bytes);
    TreeHash::new(sha256.finalize())
}

pub fn tree_hash_pair(first: TreeHash, rest: TreeHash) -> TreeHash {
    let mut sha256 = Sha256::new();
    sha256.update([2]);
    sha256.update(first);
    sha256.update(rest);
    TreeHash::new(sha256.finalize())
}

const fn th(bytes: [u8; 32]) -> TreeHash {
    TreeHash::new(bytes)
}

// sha256([1]) and sha256([1, i]) for i in 1..24, i.e. the tree hashes
// of nil and the smallest one-byte atoms
pub const PRECOMPUTED_HASHES: [TreeHash; 24] = [
    th(hex!("4bf5122f344554c53bde2ebb8cd2b7e3d1600ad631c385a5d7cce23c7785459a")),
    th(hex!("9dcf97a184f32623d11a73124ceb99a5709b083721e878a16d78f596718ba7b2")),
    th(hex!("a12871fee210fb8619291eaea194581cbd2531e4b23759d225f6806923f63222")),
    th(hex!("c79b932e1e1da3c0e098e5ad2c422937eb904a76cf61d83975a74a68fbb04b99")),
    th(hex!("a8d5dd63fba471ebcb1f3e8f7c1e1879b7152a6e7298a91ce119a63400ade7c5")),
    th(hex!("bc5959f43bc6e47175374b6716e53c9a7d72c59424c821336995bad760d9aeb3")),
    th(hex!("44602a999abbebedf7de0ae1318e4f57e3cb1d67e482a65f9657f7541f3fe4bb")),
    th(hex!("ca6c6588fa01171b200740344d354e8548b7470061fb32a34f4feee470ec281f")),
    th(hex!("9e6282e4f25e370ce617e21d6fe265e88b9e7b8682cf00059b9d128d9381f09d")),
    th(hex!("ac9e61d54eb6967e212c06aab15408292f8558c48f06f9d705150063c68753b0")),
    th(hex!("c04b5bb1a5b2eb3e9cd4805420dba5a9d133da5b7adeeafb5474c4adae9faa80")),
    th(hex!("57bfd1cb0adda3d94315053fda723f2028320faa8338225d99f629e3d46d43a9")),
    th(hex!("6b6daa8334bbcc8f6b5906b6c04be041d92700b74024f73f50e0a9f0dae5f06f")),
    th(hex!("c7b89cfb9abf2c4cb212a4840b37d762f4c880b8517b0dadb0c310ded24dd86d")),
    th(hex!("653b3bb3e18ef84d5b1e8ff9884aecf1950c7a1c98715411c22b987663b86dda")),
    th(hex!("24255ef5d941493b9978f3aabb0ed07d084ade196d23f463ff058954cbf6e9b6")),
    th(hex!("af340aa58ea7d72c2f9a7405f3734167bb27dd2a520d216addef65f8362102b6")),
    th(hex!("26e7f98cfafee5b213726e22632923bf31bf3e988233235f8f5ca5466b3ac0ed")),
    th(hex!("115b498ce94335826baa16386cd1e2fde8ca408f6f50f3785964f263cdf37ebe")),
    th(hex!("d8c50d6282a1ba47f0a23430d177bbfbb72e2b84713745e894f575570f1f3d6e")),
    th(hex!("dbe726e81a7221a385e007ef9e834a975a4b528c6f55a5d2ece288bee831a3d1")),
    th(hex!("764c8a3561c7cf261771b4e1969b84c210836f3c034baebac5e49a394a6ee0a9")),
    th(hex!("dce37f3512b6337d27290436ba9289e2fd6c775494c33668dd177cf811fbd47a")),
    th(hex!("5809addc9f6926fc5c4e20cf87958858c4454c21cdfc6b02f377f12c06b35cca")),
];

fn hash_leaf(a: &Allocator, node: NodePtr) -> TreeHash {
    if let Some(val) = a.small_number(node) {
        if (val as usize) < PRECOMPUTED_HASHES.len() {
            return PRECOMPUTED_HASHES[val as usize];
        }
    }
    tree_hash_atom(a.atom(node).as_ref())
}

/// Memoized hashes for pairs, keyed by handle. A cache is only
/// meaningful for the allocator its handles came from; feed it to
/// `tree_hash_cached` to reuse hashes across calls and across shared
/// subtrees.
#[derive(Default)]
pub struct TreeCache {
    pairs: HashMap<NodePtr, TreeHash>,
}

impl TreeCache {
    pub fn get(&self, n: NodePtr) -> Option<&TreeHash> {
        self.pairs.get(&n)
    }

    pub fn insert(&mut self, n: NodePtr, hash: TreeHash) {
        // atoms are cheap to hash fresh, only pairs earn a slot
        if matches!(n.object_type(), ObjectType::Pair) {
            self.pairs.insert(n, hash);
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

// One entry per pair on the path from the root to the subtree being
// hashed: the pair's handle, its right child, and the left child's
// hash once that side is finished.
struct Frame {
    node: NodePtr,
    right: NodePtr,
    left_hash: Option<TreeHash>,
}

fn hash_tree(a: &Allocator, node: NodePtr, mut cache: Option<&mut TreeCache>) -> TreeHash {
    let mut frames = Vec::<Frame>::new();
    let mut cur = node;
    'next_subtree: loop {
        // walk down the left spine until a leaf (or a cached pair)
        // yields a finished hash
        let mut done = loop {
            if let Some(cache) = cache.as_deref() {
                if let Some(hash) = cache.get(cur) {
                    break *hash;
                }
            }
            match a.sexp(cur) {
                SExp::Atom => break hash_leaf(a, cur),
                SExp::Pair(left, right) => {
                    frames.push(Frame {
                        node: cur,
                        right,
                        left_hash: None,
                    });
                    cur = left;
                }
            }
        };
        // fold the finished hash upward. A frame that is still missing
        // its left hash records it and sends the walk into its right
        // child instead.
        loop {
            match frames.pop() {
                None => return done,
                Some(Frame {
                    node,
                    right,
                    left_hash: None,
                }) => {
                    frames.push(Frame {
                        node,
                        right,
                        left_hash: Some(done),
                    });
                    cur = right;
                    continue 'next_subtree;
                }
                Some(Frame {
                    node,
                    left_hash: Some(left),
                    ..
                }) => {
                    done = tree_hash_pair(left, done);
                    if let Some(cache) = cache.as_deref_mut() {
                        cache.insert(node, done);
                    }
                }
            }
        }
    }
}

/// Tree hash of a node. Iterative; arbitrarily deep trees are fine.
pub fn tree_hash(a: &Allocator, node: NodePtr) -> TreeHash {
    hash_tree(a, node, None)
}

/// Like `tree_hash`, but consults and populates a cache of pair
/// hashes, so shared subtrees (and repeat calls against the same
/// allocator) hash once.
pub fn tree_hash_cached(a: &Allocator, node: NodePtr, cache: &mut TreeCache) -> TreeHash {
    hash_tree(a, node, Some(cache))
}

/// Tree hash straight off the serialized form, via the indexed parse's
/// hashing pass. No tree is built.
pub fn tree_hash_from_bytes(b: &[u8]) -> Result<TreeHash, EvalErr> {
    let (_, hashes) = parse_triples(b, true)?;
    let hashes = hashes.ok_or(EvalErr::InternalError(
        NodePtr::NIL,
        "hash pass not populated",
    ))?;
    Ok(hashes[0])
}
