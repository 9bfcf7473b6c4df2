//! Consistency proofs: a newer tree state extends an older one
//!
//! One shared node set rebuilds both roots. A node contributes to the old
//! root when its `old` position is set and to the new root when its `new`
//! position is set. On each side the first contributing node seeds the
//! accumulator and later ones are folded in by their side tag.

use super::Verifier;
use crate::hashing::fold_node;
use crate::model::{ConsistencyProofNode, Digest};
use crate::source::ProofSource;
use crate::{Error, Result};
use serde_json::json;
use tracing::{debug, trace, warn};

/// A caller's claim that the tree at `new_index` extends the one at `old_index`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsistencyClaim {
    pub old_root: Digest,
    pub old_index: u64,
    pub new_root: Digest,
    pub new_index: u64,
}

/// Roots rebuilt from a consistency proof
///
/// A side stays `None` when no proof node contributed to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsistencyRoots {
    pub old: Option<Digest>,
    pub new: Option<Digest>,
}

impl ConsistencyRoots {
    /// Both rebuilt roots equal the claimed ones
    pub fn matches(&self, old_root: &Digest, new_root: &Digest) -> bool {
        self.old.as_ref() == Some(old_root) && self.new.as_ref() == Some(new_root)
    }
}

fn accumulate(acc: Option<Digest>, node: &ConsistencyProofNode) -> Digest {
    match acc {
        None => node.hash,
        Some(acc) => fold_node(&acc, &node.hash, node.side),
    }
}

/// Fold proof nodes, ordered by new-tree position, into both roots
pub fn fold_consistency_proof(nodes: &[ConsistencyProofNode]) -> ConsistencyRoots {
    nodes.iter().fold(ConsistencyRoots::default(), |roots, node| {
        let old = match node.old {
            Some(_) => Some(accumulate(roots.old, node)),
            None => roots.old,
        };
        let new = match node.new {
            Some(_) => Some(accumulate(roots.new, node)),
            None => roots.new,
        };
        trace!(old_pos = ?node.old, new_pos = ?node.new, side = ?node.side, "folded consistency node");
        ConsistencyRoots { old, new }
    })
}

impl Verifier {
    /// Check that the tree `claim.new_root` is an append-only extension of
    /// the tree `claim.old_root`
    ///
    /// - `old_index > new_index` or `old_index == 0` cannot be checked and
    ///   return [`Error::InvalidClaim`] without querying.
    /// - `old_index == new_index` is answered without querying: the claim
    ///   holds iff both roots are the same digest.
    pub fn verify_consistency_proof<S: ProofSource + ?Sized>(
        &self,
        source: &S,
        claim: &ConsistencyClaim,
    ) -> Result<bool> {
        if claim.old_index > claim.new_index {
            return Err(Error::InvalidClaim(format!(
                "old index {} is past new index {}",
                claim.old_index, claim.new_index
            )));
        }
        if claim.old_index == 0 {
            return Err(Error::InvalidClaim(
                "old tree is empty and has no root to check".into(),
            ));
        }
        if claim.old_index == claim.new_index {
            let verified = claim.old_root == claim.new_root;
            debug!(index = claim.old_index, verified, "consistency check of a tree with itself");
            return Ok(verified);
        }

        self.check_cancelled()?;

        let rows = source.query(
            &self.config().consistency_proof_sql,
            &[json!(claim.old_index), json!(claim.new_index)],
        )?;
        debug!(
            old_index = claim.old_index,
            new_index = claim.new_index,
            nodes = rows.len(),
            "fetched consistency proof"
        );

        let nodes = rows
            .iter()
            .enumerate()
            .map(|(i, row)| ConsistencyProofNode::from_row(i, row))
            .collect::<Result<Vec<_>>>()?;

        self.check_cancelled()?;

        let roots = fold_consistency_proof(&nodes);
        let verified = roots.matches(&claim.old_root, &claim.new_root);
        if verified {
            debug!(
                old_index = claim.old_index,
                new_index = claim.new_index,
                "consistency proof verified"
            );
        } else {
            warn!(
                old_index = claim.old_index,
                new_index = claim.new_index,
                old_matches = roots.old.as_ref() == Some(&claim.old_root),
                new_matches = roots.new.as_ref() == Some(&claim.new_root),
                "consistency proof does not reproduce the claimed roots"
            );
        }
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONSISTENCY_PROOF_SQL;
    use crate::hashing::hash_nodes;
    use crate::model::Side;
    use crate::source::MemoryProofSource;
    use crate::verify_consistency_proof;
    use serde_json::Value;

    fn d(b: u8) -> Digest {
        Digest::from_bytes([b; 32])
    }

    fn h(left: &Digest, right: &Digest) -> Digest {
        hash_nodes(left.as_ref(), right.as_ref())
    }

    // Old tree of 3 leaves, new tree of 4:
    //   old = h(h(l0, l1), l2)
    //   new = h(h(l0, l1), h(l2, l3))
    fn three_to_four() -> (MemoryProofSource, Digest, Digest) {
        let (l0, l1, l2, l3) = (d(10), d(11), d(12), d(13));
        let n01 = h(&l0, &l1);
        let old_root = h(&n01, &l2);
        let new_root = h(&n01, &h(&l2, &l3));

        let source = MemoryProofSource::from_json(json!([
            {"hash": l2.to_hex(), "first": false, "old": 2, "new": 2},
            {"hash": l3.to_hex(), "first": false, "old": null, "new": 3},
            {"hash": n01.to_hex(), "first": true, "old": 4, "new": 4}
        ]))
        .unwrap();
        (source, old_root, new_root)
    }

    #[test]
    fn test_fold_consistency_proof_seeds_and_folds() {
        let nodes = [
            ConsistencyProofNode::new(d(1), Side::Right, Some(0), Some(0)),
            ConsistencyProofNode::new(d(2), Side::Right, None, Some(1)),
            ConsistencyProofNode::new(d(3), Side::Left, Some(2), None),
        ];
        let roots = fold_consistency_proof(&nodes);
        assert_eq!(roots.old, Some(h(&d(3), &d(1))));
        assert_eq!(roots.new, Some(h(&d(1), &d(2))));
    }

    #[test]
    fn test_fold_with_no_participants_leaves_sides_unset() {
        let nodes = [ConsistencyProofNode::new(d(1), Side::Left, None, Some(0))];
        let roots = fold_consistency_proof(&nodes);
        assert_eq!(roots.old, None);
        assert_eq!(roots.new, Some(d(1)));
        assert!(!roots.matches(&d(1), &d(1)));
    }

    #[test]
    fn test_valid_proof() {
        let (source, old_root, new_root) = three_to_four();
        let claim = ConsistencyClaim {
            old_root,
            old_index: 3,
            new_root,
            new_index: 4,
        };
        assert!(verify_consistency_proof(&source, &claim).unwrap());

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].sql, DEFAULT_CONSISTENCY_PROOF_SQL);
        assert_eq!(queries[0].params, vec![json!(3), json!(4)]);
    }

    #[test]
    fn test_one_side_forged_fails_closed() {
        let (source, old_root, new_root) = three_to_four();

        let forged_old = ConsistencyClaim {
            old_root: d(99),
            old_index: 3,
            new_root,
            new_index: 4,
        };
        assert!(!verify_consistency_proof(&source, &forged_old).unwrap());

        let forged_new = ConsistencyClaim {
            old_root,
            old_index: 3,
            new_root: d(99),
            new_index: 4,
        };
        assert!(!verify_consistency_proof(&source, &forged_new).unwrap());
    }

    #[test]
    fn test_idempotent() {
        let (source, old_root, new_root) = three_to_four();
        let honest = ConsistencyClaim {
            old_root,
            old_index: 3,
            new_root,
            new_index: 4,
        };
        let forged = ConsistencyClaim {
            old_root: d(99),
            ..honest
        };

        for round in 1..=3 {
            assert!(verify_consistency_proof(&source, &honest).unwrap());
            assert!(!verify_consistency_proof(&source, &forged).unwrap());
            // one fresh query per call, nothing cached between calls
            assert_eq!(source.queries().len(), round * 2);
        }
    }

    #[test]
    fn test_proof_without_old_nodes_is_false() {
        let source = MemoryProofSource::from_json(json!([
            {"hash": d(1).to_hex(), "first": false, "old": null, "new": 0}
        ]))
        .unwrap();
        let claim = ConsistencyClaim {
            old_root: d(1),
            old_index: 1,
            new_root: d(1),
            new_index: 2,
        };
        assert!(!verify_consistency_proof(&source, &claim).unwrap());
    }

    #[test]
    fn test_empty_old_tree_is_invalid_claim() {
        let source = MemoryProofSource::new(Vec::new());
        let claim = ConsistencyClaim {
            old_root: d(0),
            old_index: 0,
            new_root: d(1),
            new_index: 5,
        };
        assert!(matches!(
            verify_consistency_proof(&source, &claim),
            Err(Error::InvalidClaim(_))
        ));
        assert!(source.queries().is_empty());
    }

    #[test]
    fn test_old_past_new_is_invalid_claim() {
        let source = MemoryProofSource::new(Vec::new());
        let claim = ConsistencyClaim {
            old_root: d(0),
            old_index: 6,
            new_root: d(1),
            new_index: 5,
        };
        assert!(matches!(
            verify_consistency_proof(&source, &claim),
            Err(Error::InvalidClaim(_))
        ));
        assert!(source.queries().is_empty());
    }

    #[test]
    fn test_same_index_compares_roots_without_query() {
        let source = MemoryProofSource::new(Vec::new());
        let same = ConsistencyClaim {
            old_root: d(4),
            old_index: 5,
            new_root: d(4),
            new_index: 5,
        };
        assert!(verify_consistency_proof(&source, &same).unwrap());

        let different = ConsistencyClaim {
            new_root: d(5),
            ..same
        };
        assert!(!verify_consistency_proof(&source, &different).unwrap());
        assert!(source.queries().is_empty());
    }

    #[test]
    fn test_missing_position_field_is_an_error() {
        let source = MemoryProofSource::from_json(json!([
            {"hash": d(1).to_hex(), "first": false, "new": 0}
        ]))
        .unwrap();
        let claim = ConsistencyClaim {
            old_root: d(1),
            old_index: 1,
            new_root: d(1),
            new_index: 2,
        };
        let err = verify_consistency_proof(&source, &claim).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_collaborator_error_propagates() {
        struct Offline;
        impl ProofSource for Offline {
            fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<crate::model::ProofRow>> {
                Err(Error::collaborator("connection refused"))
            }
        }

        let claim = ConsistencyClaim {
            old_root: d(1),
            old_index: 1,
            new_root: d(2),
            new_index: 2,
        };
        let err = verify_consistency_proof(&Offline, &claim).unwrap_err();
        assert!(matches!(err, Error::Collaborator(_)));
        assert_eq!(err.to_string(), "Collaborator error: connection refused");
    }
}
