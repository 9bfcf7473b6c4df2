//! Collaborators that supply rows and proof nodes

mod memory;
mod traits;

pub use memory::{MemoryColumn, MemoryProofSource, MemoryRecord, MemoryValue, RecordedQuery};
pub use traits::{LedgerRecord, ProofSource};
