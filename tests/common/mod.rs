//! Reference ledger tree used to produce proofs the way the server does
//!
//! Trees split at the largest power of two below their size, so every
//! aligned complete subtree is a node of every larger tree.

#![allow(dead_code)]

use serde_json::{json, Value};
use tbledger::{hash_nodes, hash_record, Digest, MemoryRecord};

pub fn node(left: &Digest, right: &Digest) -> Digest {
    hash_nodes(left.as_ref(), right.as_ref())
}

/// Leaf digests of `n` simple ledger rows
pub fn ledger_leaves(n: usize) -> Vec<Digest> {
    (0..n)
        .map(|i| {
            let mut record = MemoryRecord::new()
                .with_text("record_id", "BIGINT", i.to_string())
                .with_text("amount", "NUMERIC", format!("{}.00", 100 + i))
                .with_text("comment", "VARCHAR", format!("entry {i}"));
            hash_record(&mut record).unwrap()
        })
        .collect()
}

fn split(n: usize) -> usize {
    let mut k = 1;
    while k * 2 < n {
        k *= 2;
    }
    k
}

pub fn root(leaves: &[Digest]) -> Digest {
    match leaves.len() {
        0 => panic!("empty tree has no root"),
        1 => leaves[0],
        n => {
            let k = split(n);
            node(&root(&leaves[..k]), &root(&leaves[k..]))
        }
    }
}

/// Siblings from the aligned subtree `[start, start + size)` up to the root,
/// with `true` marking a left sibling
pub fn subtree_path(leaves: &[Digest], start: usize, size: usize) -> Vec<(Digest, bool)> {
    let n = leaves.len();
    if n == size {
        return Vec::new();
    }
    let k = split(n);
    if start < k {
        let mut path = subtree_path(&leaves[..k], start, size);
        path.push((root(&leaves[k..]), false));
        path
    } else {
        let mut path = subtree_path(&leaves[k..], start - k, size);
        path.push((root(&leaves[..k]), true));
        path
    }
}

pub fn audit_rows(leaves: &[Digest], index: usize) -> Value {
    let rows: Vec<Value> = subtree_path(leaves, index, 1)
        .into_iter()
        .map(|(hash, first)| json!({"hash": hash.to_hex(), "first": first}))
        .collect();
    Value::Array(rows)
}

/// Consistency proof between the first `old_size` leaves and all of them
///
/// Starts at the last complete subtree of the old tree; left siblings
/// above it rebuild the old root, all siblings rebuild the new one.
pub fn consistency_rows(leaves: &[Digest], old_size: usize) -> Value {
    let size = 1 << old_size.trailing_zeros();
    let start = old_size - size;
    let seed = root(&leaves[start..old_size]);

    let mut rows = vec![json!({"hash": seed.to_hex(), "first": false, "old": 0, "new": 0})];
    for (pos, (hash, first)) in subtree_path(leaves, start, size).into_iter().enumerate() {
        let pos = pos + 1;
        rows.push(json!({
            "hash": hash.to_hex(),
            "first": first,
            "old": if first { json!(pos) } else { Value::Null },
            "new": pos
        }));
    }
    Value::Array(rows)
}
