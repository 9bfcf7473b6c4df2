//! # tbledger
//!
//! Client-side verification for tamper-evident Transbase ledger tables.
//!
//! Every row of a ledger table is a leaf of a Merkle tree that the database
//! maintains. This crate recomputes leaf digests from fetched rows and
//! checks the two kinds of proof the server can produce, so a client does
//! not have to trust the server's word about ledger integrity.
//!
//! ## Core Concepts
//!
//! - **Leaf digest**: SHA-256 over a row's columns, see [`hash_record`]
//! - **Node digest**: SHA-256 over two child digests, see [`hash_nodes`]
//! - **Audit proof**: the sibling path from a leaf to a root
//! - **Consistency proof**: shared nodes rebuilding an old and a new root
//!
//! The database side is reached only through two traits:
//! [`LedgerRecord`] for reading a row and [`ProofSource`] for running the
//! proof queries.
//!
//! ## Example
//!
//! ```ignore
//! use tbledger::{hash_record, verify_audit_proof, AuditClaim};
//!
//! let leaf = hash_record(&mut row)?;
//! let ok = verify_audit_proof(&connection, &AuditClaim {
//!     root,
//!     tree_index: 42,
//!     record_id: 7,
//!     record_hash: leaf,
//! })?;
//! ```

pub mod config;
pub mod hashing;
pub mod model;
pub mod source;
pub mod verify;

mod error;

pub use config::LedgerConfig;
pub use error::{Error, Result, SourceError};
pub use hashing::{hash_nodes, hash_record, RecordHasher};
pub use model::{
    AuditProofNode, ColumnInfo, ConsistencyProofNode, Digest, LobChunk, ProofRow, Side,
};
pub use source::{LedgerRecord, MemoryProofSource, MemoryRecord, ProofSource};
pub use verify::{
    verify_audit_proof, verify_consistency_proof, AuditClaim, CancelFlag, ConsistencyClaim,
    ConsistencyRoots, Verifier,
};
