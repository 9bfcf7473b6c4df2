//! Proof nodes as returned by the ledger proof functions
//!
//! The server hands back plain rows. Each row carries `hash` (hex digest)
//! and `first` (whether this node is the left operand when folded with the
//! running accumulator). Consistency rows additionally carry nullable
//! `old` and `new` positions that mark which tree state the node helps
//! reconstruct.

use super::Digest;
use crate::{Error, Result};
use serde_json::Value;

/// A single row returned by the query executor, keyed by column name
pub type ProofRow = serde_json::Map<String, Value>;

/// Which operand a proof node becomes when folded with the accumulator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// `first = true`: parent = hash_nodes(node, acc)
    Left,
    /// `first = false`: parent = hash_nodes(acc, node)
    Right,
}

impl Side {
    /// Map the server's `first` flag onto a side
    pub fn from_first(first: bool) -> Self {
        if first {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// The `first` flag this side corresponds to
    pub fn is_first(self) -> bool {
        self == Side::Left
    }
}

/// A sibling on the path from a leaf to the root
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuditProofNode {
    pub hash: Digest,
    pub side: Side,
}

impl AuditProofNode {
    pub fn new(hash: Digest, side: Side) -> Self {
        AuditProofNode { hash, side }
    }

    /// Parse a proof row; `row_no` is only used for error reporting
    pub fn from_row(row_no: usize, row: &ProofRow) -> Result<Self> {
        Ok(AuditProofNode {
            hash: parse_hash(row_no, row)?,
            side: parse_side(row_no, row)?,
        })
    }
}

/// A node shared between the old and new tree reconstructions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsistencyProofNode {
    pub hash: Digest,
    pub side: Side,
    /// Position in the old tree, if the node contributes to the old root
    pub old: Option<u64>,
    /// Position in the new tree, if the node contributes to the new root
    pub new: Option<u64>,
}

impl ConsistencyProofNode {
    pub fn new(hash: Digest, side: Side, old: Option<u64>, new: Option<u64>) -> Self {
        ConsistencyProofNode {
            hash,
            side,
            old,
            new,
        }
    }

    /// Parse a proof row. `old` and `new` must be present but may be null.
    pub fn from_row(row_no: usize, row: &ProofRow) -> Result<Self> {
        Ok(ConsistencyProofNode {
            hash: parse_hash(row_no, row)?,
            side: parse_side(row_no, row)?,
            old: parse_position(row_no, row, "old")?,
            new: parse_position(row_no, row, "new")?,
        })
    }
}

fn malformed(row_no: usize, reason: impl Into<String>) -> Error {
    Error::MalformedProof {
        row: row_no,
        reason: reason.into(),
    }
}

fn field<'a>(row_no: usize, row: &'a ProofRow, name: &str) -> Result<&'a Value> {
    row.get(name)
        .ok_or_else(|| malformed(row_no, format!("missing field `{name}`")))
}

fn parse_hash(row_no: usize, row: &ProofRow) -> Result<Digest> {
    match field(row_no, row, "hash")? {
        Value::String(s) => Digest::from_hex(s)
            .map_err(|e| malformed(row_no, format!("field `hash` is not a 32-byte hex digest: {e}"))),
        Value::Null => Err(malformed(row_no, "field `hash` is null")),
        other => Err(malformed(
            row_no,
            format!("field `hash` must be a hex string, got {other}"),
        )),
    }
}

// Plain-string result mode delivers booleans as text, typed mode as JSON
// booleans; some drivers use 0/1.
fn parse_side(row_no: usize, row: &ProofRow) -> Result<Side> {
    let first = match field(row_no, row, "first")? {
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_u64() {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(malformed(row_no, format!("field `first` is not a boolean: {n}"))),
        },
        Value::String(s) if s.eq_ignore_ascii_case("true") => true,
        Value::String(s) if s.eq_ignore_ascii_case("false") => false,
        other => {
            return Err(malformed(
                row_no,
                format!("field `first` is not a boolean: {other}"),
            ))
        }
    };
    Ok(Side::from_first(first))
}

fn parse_position(row_no: usize, row: &ProofRow, name: &str) -> Result<Option<u64>> {
    match field(row_no, row, name)? {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(Some).ok_or_else(|| {
            malformed(row_no, format!("field `{name}` is not a tree position: {n}"))
        }),
        Value::String(s) => s.trim().parse::<u64>().map(Some).map_err(|_| {
            malformed(row_no, format!("field `{name}` is not a tree position: {s:?}"))
        }),
        other => Err(malformed(
            row_no,
            format!("field `{name}` is not a tree position: {other}"),
        )),
    }
}
