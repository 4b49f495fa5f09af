mod de;
mod de_tree;
mod parse_atom;
mod ser;
mod tools;

pub use de::{node_from_bytes, node_from_bytes_consumed};
pub use de_tree::{parse_triples, subtree_bytes, ParsedTriple};
pub use ser::node_to_bytes;
pub use tools::serialized_length_from_bytes;
