//! Leaf and internal-node hashing
//!
//! Leaves and internal nodes use different leading bytes (`0x00` and
//! `0x01`), so a leaf digest can never stand in for a node digest.

mod node;
mod record;

pub use node::{fold_node, hash_nodes, NODE_MARKER};
pub use record::{
    hash_record, RecordHasher, DEFAULT_CHUNK_SIZE, LEAF_MARKER, NULL_MARKER, PRESENT_MARKER,
};
