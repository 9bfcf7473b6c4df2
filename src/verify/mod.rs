//! Audit and consistency proof verification
//!
//! Each verification issues exactly one proof query and folds the returned
//! nodes with [`crate::hashing::fold_node`]. The outcome is `Ok(true)` or
//! `Ok(false)`; an `Err` means the check could not be carried out.

mod audit;
mod consistency;

pub use audit::{fold_audit_path, AuditClaim};
pub use consistency::{fold_consistency_proof, ConsistencyClaim, ConsistencyRoots};

use crate::config::LedgerConfig;
use crate::hashing::RecordHasher;
use crate::model::Digest;
use crate::source::{LedgerRecord, ProofSource};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation shared between a caller and a [`Verifier`]
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Verifies ledger proofs using the configured proof queries
///
/// Holds no state between calls and can be shared across threads.
#[derive(Clone, Debug, Default)]
pub struct Verifier {
    config: LedgerConfig,
    cancel: Option<CancelFlag>,
}

impl Verifier {
    pub fn new(config: LedgerConfig) -> Self {
        Verifier {
            config,
            cancel: None,
        }
    }

    /// Stop before issuing (or folding) a proof once `flag` is cancelled
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Record hasher using the configured chunk size
    pub fn record_hasher(&self) -> Result<RecordHasher> {
        RecordHasher::with_chunk_size(self.config.lob_chunk_size)
    }

    /// Leaf digest of `record`
    pub fn hash_record<R: LedgerRecord + ?Sized>(&self, record: &mut R) -> Result<Digest> {
        self.record_hasher()?.hash(record)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Verify an audit proof with the default configuration
pub fn verify_audit_proof<S: ProofSource + ?Sized>(source: &S, claim: &AuditClaim) -> Result<bool> {
    Verifier::default().verify_audit_proof(source, claim)
}

/// Verify a consistency proof with the default configuration
pub fn verify_consistency_proof<S: ProofSource + ?Sized>(
    source: &S,
    claim: &ConsistencyClaim,
) -> Result<bool> {
    Verifier::default().verify_consistency_proof(source, claim)
}
