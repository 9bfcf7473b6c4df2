//! Core data model types for tbledger

mod digest;
mod proof;
mod record;

pub use digest::{Digest, DIGEST_LEN};
pub use proof::{AuditProofNode, ConsistencyProofNode, ProofRow, Side};
pub use record::{ColumnInfo, LobChunk, LARGE_OBJECT_TYPES, RECORD_ID_COLUMN};
