//! Audit proofs: inclusion of one record in a tree state

use super::Verifier;
use crate::hashing::fold_node;
use crate::model::{AuditProofNode, Digest};
use crate::source::ProofSource;
use crate::Result;
use serde_json::json;
use tracing::{debug, trace, warn};

/// A caller's claim that a record is part of a ledger tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuditClaim {
    /// Root of the tree the record should be included in
    pub root: Digest,
    /// Size/index identifying that tree state
    pub tree_index: u64,
    /// Identity of the record on the server
    pub record_id: i64,
    /// Leaf digest of the record, usually from [`crate::hash_record`]
    pub record_hash: Digest,
}

/// Fold a sibling path, ordered from the leaf upwards, into a root
///
/// An empty path returns the leaf itself.
pub fn fold_audit_path(leaf: Digest, path: &[AuditProofNode]) -> Digest {
    path.iter().fold(leaf, |acc, node| {
        let parent = fold_node(&acc, &node.hash, node.side);
        trace!(side = ?node.side, parent = %parent.short(), "folded audit node");
        parent
    })
}

impl Verifier {
    /// Check that `claim.record_hash` is included in the tree `claim.root`
    pub fn verify_audit_proof<S: ProofSource + ?Sized>(
        &self,
        source: &S,
        claim: &AuditClaim,
    ) -> Result<bool> {
        self.check_cancelled()?;

        let rows = source.query(
            &self.config().audit_proof_sql,
            &[json!(claim.tree_index), json!(claim.record_id)],
        )?;
        debug!(
            tree_index = claim.tree_index,
            record_id = claim.record_id,
            nodes = rows.len(),
            "fetched audit proof"
        );

        // Parse everything before folding so a malformed row is never
        // reported as a mismatch
        let path = rows
            .iter()
            .enumerate()
            .map(|(i, row)| AuditProofNode::from_row(i, row))
            .collect::<Result<Vec<_>>>()?;

        self.check_cancelled()?;

        let computed = fold_audit_path(claim.record_hash, &path);
        let verified = computed == claim.root;
        if verified {
            debug!(tree_index = claim.tree_index, record_id = claim.record_id, "audit proof verified");
        } else {
            warn!(
                tree_index = claim.tree_index,
                record_id = claim.record_id,
                "audit proof does not reproduce the claimed root"
            );
        }
        Ok(verified)
    }
}
