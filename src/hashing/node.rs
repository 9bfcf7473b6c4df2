//! Internal-node hashing

use crate::model::{Digest, Side};

/// Leading byte of every internal-node preimage
pub const NODE_MARKER: u8 = 0x01;

/// Hash two children into their parent: `sha256(0x01 || left || right)`
///
/// Order matters. Inputs are taken as plain byte strings so that any pair
/// of values can be combined, not only 32-byte digests.
pub fn hash_nodes(left: &[u8], right: &[u8]) -> Digest {
    Digest::digest_many(&[&[NODE_MARKER], left, right])
}

/// Fold one proof node into the running accumulator
///
/// A [`Side::Left`] node is the left child (`hash_nodes(node, acc)`), a
/// [`Side::Right`] node the right child (`hash_nodes(acc, node)`).
pub fn fold_node(acc: &Digest, node: &Digest, side: Side) -> Digest {
    match side {
        Side::Left => hash_nodes(node.as_ref(), acc.as_ref()),
        Side::Right => hash_nodes(acc.as_ref(), node.as_ref()),
    }
}
