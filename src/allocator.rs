use crate::error::EvalErr;
use crate::number::{number_from_u8, number_to_signed_bytes, Number};
use num_traits::Zero;
use std::ops::Deref;

/// The object type tag carried in the upper bits of a `NodePtr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Bytes,
    Pair,
    SmallAtom,
}

const NODE_PTR_IDX_BITS: u32 = 30;
const NODE_PTR_IDX_MASK: u32 = (1 << NODE_PTR_IDX_BITS) - 1;

/// A compact handle to a node in an `Allocator`. Atoms that are the
/// canonical encoding of an integer below 2^30 are stored inline in the
/// handle itself (the small-atom fast path), so nil, all opcode bytes and
/// small integers never touch the heap and compare equal by handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePtr(u32);

impl NodePtr {
    pub const NIL: Self = Self::new(ObjectType::SmallAtom, 0);

    const fn new(t: ObjectType, idx: usize) -> Self {
        debug_assert!(idx <= NODE_PTR_IDX_MASK as usize);
        NodePtr(((t as u32) << NODE_PTR_IDX_BITS) | (idx as u32))
    }

    pub fn object_type(self) -> ObjectType {
        match self.0 >> NODE_PTR_IDX_BITS {
            0 => ObjectType::Bytes,
            1 => ObjectType::Pair,
            _ => ObjectType::SmallAtom,
        }
    }

    pub fn index(self) -> u32 {
        self.0 & NODE_PTR_IDX_MASK
    }

    fn parts(self) -> (ObjectType, usize) {
        (self.object_type(), self.index() as usize)
    }
}

impl Default for NodePtr {
    fn default() -> Self {
        Self::NIL
    }
}

impl std::fmt::Debug for NodePtr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodePtr({:?}, {})", self.object_type(), self.index())
    }
}

/// A view of a node, either an atom or a pair of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SExp {
    Atom,
    Pair(NodePtr, NodePtr),
}

/// A borrowed view of an atom's bytes. Small atoms materialize their
/// canonical encoding into an inline buffer; everything else borrows
/// from the arena.
pub enum Atom<'a> {
    Borrowed(&'a [u8]),
    U32([u8; 4], usize),
}

impl Atom<'_> {
    pub fn as_ref(&self) -> &[u8] {
        match self {
            Atom::Borrowed(bytes) => bytes,
            Atom::U32(buf, len) => &buf[0..*len],
        }
    }
}

impl Deref for Atom<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

impl AsRef<[u8]> for Atom<'_> {
    fn as_ref(&self) -> &[u8] {
        Atom::as_ref(self)
    }
}

/// Visitor view used by tree walks that want to special-case small
/// atoms (e.g. the tree hash's precomputed table).
pub enum NodeVisitor<'a> {
    Buffer(&'a [u8]),
    U32(u32),
    Pair(NodePtr, NodePtr),
}

#[derive(Clone, Copy)]
struct AtomBuf {
    start: u32,
    end: u32,
}

#[derive(Clone, Copy)]
struct IntPair {
    first: NodePtr,
    rest: NodePtr,
}

const MAX_NUM_ATOMS: usize = 62_500_000;
const MAX_NUM_PAIRS: usize = 62_500_000;

/// Encode a small non-negative integer into the inline atom buffer,
/// returning the canonical byte length.
fn u32_to_atom_buf(val: u32, buf: &mut [u8; 4]) -> usize {
    debug_assert!(val <= NODE_PTR_IDX_MASK);
    if val == 0 {
        return 0;
    }
    let bytes = val.to_be_bytes();
    let mut start = 0;
    while start < 3 && bytes[start] == 0 {
        start += 1;
    }
    if bytes[start] & 0x80 != 0 {
        // needs a 0x00 sign pad; vals < 2^30 always leave room for it
        buf[0] = 0;
        buf[1..1 + 4 - start].copy_from_slice(&bytes[start..]);
        4 - start + 1
    } else {
        buf[0..4 - start].copy_from_slice(&bytes[start..]);
        4 - start
    }
}

/// If the byte string is the canonical encoding of an integer in
/// 0..2^30, return that value.
fn canonical_small_number(v: &[u8]) -> Option<u32> {
    match v.len() {
        0 => Some(0),
        len if len <= 4 => {
            if v[0] & 0x80 != 0 {
                return None; // negative
            }
            if v[0] == 0 && (len == 1 || v[1] & 0x80 == 0) {
                return None; // redundant leading zero
            }
            let mut val: u32 = 0;
            for b in v {
                if val > NODE_PTR_IDX_MASK >> 8 {
                    return None;
                }
                val = (val << 8) | u32::from(*b);
            }
            Some(val)
        }
        _ => None,
    }
}

/// Append-only arena owning every atom and pair created during a run.
/// Handles stay valid for the lifetime of the arena; storage is only
/// released when the arena is dropped.
pub struct Allocator {
    // all atom payloads, back to back
    u8_vec: Vec<u8>,
    atom_vec: Vec<AtomBuf>,
    pair_vec: Vec<IntPair>,
    heap_limit: usize,
    // total atoms handed out, including inline small atoms
    atom_count: usize,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    pub fn new() -> Self {
        Self::new_limited(u32::MAX as usize)
    }

    pub fn new_limited(heap_limit: usize) -> Self {
        Self {
            u8_vec: Vec::new(),
            atom_vec: Vec::new(),
            pair_vec: Vec::new(),
            heap_limit,
            atom_count: 0,
        }
    }

    fn check_atom_limit(&mut self) -> Result<(), EvalErr> {
        if self.atom_count >= MAX_NUM_ATOMS {
            Err(EvalErr::TooManyAtoms)
        } else {
            self.atom_count += 1;
            Ok(())
        }
    }

    pub fn new_atom(&mut self, v: &[u8]) -> Result<NodePtr, EvalErr> {
        self.check_atom_limit()?;
        if let Some(val) = canonical_small_number(v) {
            return Ok(NodePtr::new(ObjectType::SmallAtom, val as usize));
        }
        let start = self.u8_vec.len();
        if self.heap_limit - start < v.len() {
            return Err(EvalErr::TooManyAtoms);
        }
        if v.len() > u32::MAX as usize {
            return Err(EvalErr::TooLarge);
        }
        self.u8_vec.extend_from_slice(v);
        let end = self.u8_vec.len();
        self.atom_vec.push(AtomBuf {
            start: start as u32,
            end: end as u32,
        });
        Ok(NodePtr::new(ObjectType::Bytes, self.atom_vec.len() - 1))
    }

    pub fn new_small_number(&mut self, val: u32) -> Result<NodePtr, EvalErr> {
        debug_assert!(val <= NODE_PTR_IDX_MASK);
        self.check_atom_limit()?;
        Ok(NodePtr::new(ObjectType::SmallAtom, val as usize))
    }

    pub fn new_pair(&mut self, first: NodePtr, rest: NodePtr) -> Result<NodePtr, EvalErr> {
        if self.pair_vec.len() >= MAX_NUM_PAIRS {
            return Err(EvalErr::TooManyPairs);
        }
        self.pair_vec.push(IntPair { first, rest });
        Ok(NodePtr::new(ObjectType::Pair, self.pair_vec.len() - 1))
    }

    /// A zero-copy view into a byte range of an existing atom. The range
    /// must have been validated by the caller.
    pub fn new_substr(&mut self, node: NodePtr, start: u32, end: u32) -> Result<NodePtr, EvalErr> {
        let (t, idx) = node.parts();
        match t {
            ObjectType::Bytes => {
                self.check_atom_limit()?;
                let buf = self.atom_vec[idx];
                if start > end || end - start > buf.end - buf.start {
                    return Err(EvalErr::InternalError(node, "substr out of bounds"));
                }
                self.atom_vec.push(AtomBuf {
                    start: buf.start + start,
                    end: buf.start + end,
                });
                Ok(NodePtr::new(ObjectType::Bytes, self.atom_vec.len() - 1))
            }
            ObjectType::SmallAtom => {
                let mut buf = [0_u8; 4];
                let len = u32_to_atom_buf(idx as u32, &mut buf);
                if start > end || end as usize > len {
                    return Err(EvalErr::InternalError(node, "substr out of bounds"));
                }
                let sub = buf[start as usize..end as usize].to_vec();
                self.new_atom(&sub)
            }
            ObjectType::Pair => Err(EvalErr::InternalError(node, "substr of pair")),
        }
    }

    /// Concatenate the given atoms into one newly allocated atom.
    pub fn new_concat(&mut self, new_size: usize, nodes: &[NodePtr]) -> Result<NodePtr, EvalErr> {
        self.check_atom_limit()?;
        if self.heap_limit - self.u8_vec.len() < new_size {
            return Err(EvalErr::TooManyAtoms);
        }
        if new_size > u32::MAX as usize {
            return Err(EvalErr::TooLarge);
        }
        let start = self.u8_vec.len();
        self.u8_vec.reserve(new_size);
        for node in nodes {
            let (t, idx) = node.parts();
            match t {
                ObjectType::Pair => {
                    return Err(EvalErr::InternalError(*node, "concat of pair"));
                }
                ObjectType::SmallAtom => {
                    let mut buf = [0_u8; 4];
                    let len = u32_to_atom_buf(idx as u32, &mut buf);
                    self.u8_vec.extend_from_slice(&buf[0..len]);
                }
                ObjectType::Bytes => {
                    let buf = self.atom_vec[idx];
                    self.u8_vec
                        .extend_from_within(buf.start as usize..buf.end as usize);
                }
            }
        }
        let end = self.u8_vec.len();
        if end - start != new_size {
            return Err(EvalErr::InternalError(
                NodePtr::NIL,
                "concat size mismatch",
            ));
        }
        self.atom_vec.push(AtomBuf {
            start: start as u32,
            end: end as u32,
        });
        Ok(NodePtr::new(ObjectType::Bytes, self.atom_vec.len() - 1))
    }

    pub fn new_number(&mut self, v: Number) -> Result<NodePtr, EvalErr> {
        let bytes = number_to_signed_bytes(&v);
        self.new_atom(&bytes)
    }

    pub fn sexp(&self, node: NodePtr) -> SExp {
        let (t, idx) = node.parts();
        match t {
            ObjectType::Bytes | ObjectType::SmallAtom => SExp::Atom,
            ObjectType::Pair => {
                let pair = self.pair_vec[idx];
                SExp::Pair(pair.first, pair.rest)
            }
        }
    }

    pub fn node(&self, node: NodePtr) -> NodeVisitor<'_> {
        let (t, idx) = node.parts();
        match t {
            ObjectType::Bytes => {
                let buf = self.atom_vec[idx];
                NodeVisitor::Buffer(&self.u8_vec[buf.start as usize..buf.end as usize])
            }
            ObjectType::SmallAtom => NodeVisitor::U32(idx as u32),
            ObjectType::Pair => {
                let pair = self.pair_vec[idx];
                NodeVisitor::Pair(pair.first, pair.rest)
            }
        }
    }

    /// The atom's bytes. Panics if the node is a pair; check `sexp()`
    /// first when the kind is not already known.
    pub fn atom(&self, node: NodePtr) -> Atom<'_> {
        let (t, idx) = node.parts();
        match t {
            ObjectType::Bytes => {
                let buf = self.atom_vec[idx];
                Atom::Borrowed(&self.u8_vec[buf.start as usize..buf.end as usize])
            }
            ObjectType::SmallAtom => {
                let mut buf = [0_u8; 4];
                let len = u32_to_atom_buf(idx as u32, &mut buf);
                Atom::U32(buf, len)
            }
            ObjectType::Pair => panic!("expected atom, got pair"),
        }
    }

    pub fn atom_len(&self, node: NodePtr) -> usize {
        let (t, idx) = node.parts();
        match t {
            ObjectType::Bytes => {
                let buf = self.atom_vec[idx];
                (buf.end - buf.start) as usize
            }
            ObjectType::SmallAtom => {
                let mut buf = [0_u8; 4];
                u32_to_atom_buf(idx as u32, &mut buf)
            }
            ObjectType::Pair => panic!("expected atom, got pair"),
        }
    }

    /// The value of a canonically encoded small integer atom, if the
    /// node is one. Views created by `new_substr` land in byte storage
    /// even when their content is canonical, so both representations
    /// are recognized here.
    pub fn small_number(&self, node: NodePtr) -> Option<u32> {
        let (t, idx) = node.parts();
        match t {
            ObjectType::SmallAtom => Some(idx as u32),
            ObjectType::Bytes => {
                let buf = self.atom_vec[idx];
                canonical_small_number(&self.u8_vec[buf.start as usize..buf.end as usize])
            }
            ObjectType::Pair => None,
        }
    }

    pub fn number(&self, node: NodePtr) -> Number {
        match self.node(node) {
            NodeVisitor::Buffer(bytes) => number_from_u8(bytes),
            NodeVisitor::U32(val) => Number::from(val),
            NodeVisitor::Pair(..) => Number::zero(),
        }
    }

    pub fn pair(&self, node: NodePtr) -> Option<(NodePtr, NodePtr)> {
        match self.sexp(node) {
            SExp::Pair(first, rest) => Some((first, rest)),
            SExp::Atom => None,
        }
    }

    pub fn atom_eq(&self, lhs: NodePtr, rhs: NodePtr) -> bool {
        if lhs == rhs {
            return true;
        }
        self.atom(lhs).as_ref() == self.atom(rhs).as_ref()
    }

    pub fn nil(&self) -> NodePtr {
        NodePtr::NIL
    }

    pub fn one(&self) -> NodePtr {
        NodePtr::new(ObjectType::SmallAtom, 1)
    }

    pub fn atom_count(&self) -> usize {
        self.atom_count
    }

    pub fn pair_count(&self) -> usize {
        self.pair_vec.len()
    }

    pub fn heap_size(&self) -> usize {
        self.u8_vec.len()
    }
}
