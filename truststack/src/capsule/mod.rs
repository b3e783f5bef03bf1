//! Temporal integrity capsules.
//!
//! A [`Capsule`] is a content-addressed bundle tying a ledger position to
//! an HDAG snapshot digest at capture time, plus the hash of the model in
//! play. Its `id` is a BLAKE3-256 digest over the canonical encoding of
//! every other field, so a capsule cannot be altered without changing its
//! id.
//!
//! Verification is tri-state: a capsule can be internally consistent but
//! still point at ledger/HDAG state that has since been rewritten, and
//! callers must be able to tell those cases apart (see
//! [`CapsuleVerdict`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hdag::Hdag;
use crate::ledger::{Ledger, unix_timestamp};
use crate::types::{BlockHash, CapsuleId, Hash256, ModelHash, canonical_bytes};

/// Reference to one sealed block: its chain index plus its hash.
///
/// Storing both lets verification detect the difference between "block
/// gone" and "block silently replaced at the same index".
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockRef {
    pub index: u64,
    pub hash: BlockHash,
}

/// Immutable, content-addressed capture of pipeline state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// Content hash of the other four fields.
    pub id: CapsuleId,
    /// Digest of the model the capsule was built for.
    pub model_hash: ModelHash,
    /// The ledger tip at capture time.
    pub ledger_ref: BlockRef,
    /// [`Hdag::digest`] of the graph at capture time.
    pub hdag_ref: Hash256,
    /// Capture timestamp, seconds since Unix epoch.
    pub created_at: u64,
}

/// The hashed subset of a capsule's fields, in canonical order.
#[derive(Serialize)]
struct HashedFields<'a> {
    model_hash: &'a ModelHash,
    ledger_ref: &'a BlockRef,
    hdag_ref: &'a Hash256,
    created_at: u64,
}

impl Capsule {
    /// Recomputes the content id from the capsule's own fields.
    pub fn compute_id(&self) -> CapsuleId {
        let bytes = canonical_bytes(&HashedFields {
            model_hash: &self.model_hash,
            ledger_ref: &self.ledger_ref,
            hdag_ref: &self.hdag_ref,
            created_at: self.created_at,
        });
        CapsuleId(Hash256::compute(&bytes))
    }
}

/// Result of verifying a capsule against the live structures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CapsuleVerdict {
    /// Internally consistent and the referenced state is unchanged.
    Valid,
    /// The recomputed content id does not match the stored id: the
    /// capsule itself was altered after construction.
    TamperedCapsule,
    /// The capsule is internally consistent, but the referenced ledger
    /// block or HDAG state no longer matches the live structures.
    StaleReference,
}

impl CapsuleVerdict {
    /// Returns `true` only for [`CapsuleVerdict::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, CapsuleVerdict::Valid)
    }
}

impl fmt::Display for CapsuleVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapsuleVerdict::Valid => write!(f, "valid"),
            CapsuleVerdict::TamperedCapsule => write!(f, "tampered capsule"),
            CapsuleVerdict::StaleReference => write!(f, "stale reference"),
        }
    }
}

/// Builds and verifies capsules against a ledger and a graph.
///
/// Stateless; both operations read the live structures passed in by the
/// caller, so verification is side-effect-free and safely parallelizable
/// across unrelated capsules.
#[derive(Clone, Copy, Debug, Default)]
pub struct CapsuleBuilder;

impl CapsuleBuilder {
    /// Captures the current ledger tip and HDAG digest, stamped now.
    pub fn build(&self, model_hash: ModelHash, ledger: &Ledger, hdag: &Hdag) -> Capsule {
        self.build_at(model_hash, ledger, hdag, unix_timestamp())
    }

    /// Captures the current state with an explicit timestamp.
    pub fn build_at(
        &self,
        model_hash: ModelHash,
        ledger: &Ledger,
        hdag: &Hdag,
        created_at: u64,
    ) -> Capsule {
        let tip = ledger.tip();
        let mut capsule = Capsule {
            id: CapsuleId(Hash256::zero()),
            model_hash,
            ledger_ref: BlockRef {
                index: tip.index,
                hash: tip.hash,
            },
            hdag_ref: hdag.digest(),
            created_at,
        };
        capsule.id = capsule.compute_id();
        capsule
    }

    /// Verifies a capsule against the live ledger and graph.
    ///
    /// Checks, in order:
    ///
    /// 1. the stored id matches the recomputed content id
    ///    (else [`CapsuleVerdict::TamperedCapsule`]);
    /// 2. `ledger_ref` still resolves to a block with the same hash and
    ///    the live HDAG digest equals `hdag_ref`
    ///    (else [`CapsuleVerdict::StaleReference`]).
    pub fn verify(&self, capsule: &Capsule, ledger: &Ledger, hdag: &Hdag) -> CapsuleVerdict {
        if capsule.compute_id() != capsule.id {
            return CapsuleVerdict::TamperedCapsule;
        }

        let block_matches = ledger
            .block_by_index(capsule.ledger_ref.index)
            .is_some_and(|block| block.hash == capsule.ledger_ref.hash);
        if !block_matches {
            return CapsuleVerdict::StaleReference;
        }

        if hdag.digest() != capsule.hdag_ref {
            return CapsuleVerdict::StaleReference;
        }

        CapsuleVerdict::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdag::Vector;
    use crate::types::Transaction;

    fn dummy_model_hash() -> ModelHash {
        ModelHash::from_params(b"test-model-v1")
    }

    fn sample_state() -> (Ledger, Hdag) {
        let mut ledger = Ledger::with_genesis_timestamp(1_700_000_000);
        ledger.add_transaction(Transaction::new().with("sensor", "lumen").with("value", 1337i64));
        ledger.create_block_at(1_700_000_001);

        let mut hdag = Hdag::new();
        hdag.add_node("sensor", Vector::from_slice(&[1.0, 0.5, 0.1]));
        hdag.add_node("feature", Vector::from_slice(&[0.8, 0.55, 0.05]));
        hdag.add_edge("sensor", "feature", 0.9).unwrap();

        (ledger, hdag)
    }

    #[test]
    fn capsule_is_valid_immediately_after_build() {
        let (ledger, hdag) = sample_state();
        let builder = CapsuleBuilder;

        let capsule = builder.build_at(dummy_model_hash(), &ledger, &hdag, 1_700_000_002);
        assert_eq!(capsule.ledger_ref.index, 1);
        assert_eq!(
            builder.verify(&capsule, &ledger, &hdag),
            CapsuleVerdict::Valid
        );
    }

    #[test]
    fn altered_fields_yield_tampered_capsule() {
        let (ledger, hdag) = sample_state();
        let builder = CapsuleBuilder;
        let capsule = builder.build_at(dummy_model_hash(), &ledger, &hdag, 1_700_000_002);

        let mut tampered = capsule.clone();
        tampered.created_at += 1;
        assert_eq!(
            builder.verify(&tampered, &ledger, &hdag),
            CapsuleVerdict::TamperedCapsule
        );

        let mut tampered = capsule.clone();
        tampered.model_hash = ModelHash::from_params(b"other-model");
        assert_eq!(
            builder.verify(&tampered, &ledger, &hdag),
            CapsuleVerdict::TamperedCapsule
        );

        let mut tampered = capsule;
        tampered.hdag_ref = Hash256::compute(b"other-graph");
        assert_eq!(
            builder.verify(&tampered, &ledger, &hdag),
            CapsuleVerdict::TamperedCapsule
        );
    }

    #[test]
    fn chain_reset_yields_stale_reference() {
        let (ledger, hdag) = sample_state();
        let builder = CapsuleBuilder;
        let capsule = builder.build_at(dummy_model_hash(), &ledger, &hdag, 1_700_000_002);

        // A fresh ledger no longer contains the referenced block.
        let fresh = Ledger::with_genesis_timestamp(1_700_000_100);
        assert_eq!(
            builder.verify(&capsule, &fresh, &hdag),
            CapsuleVerdict::StaleReference
        );
    }

    #[test]
    fn silently_replaced_block_yields_stale_reference() {
        let (mut ledger, hdag) = sample_state();
        let builder = CapsuleBuilder;
        let capsule = builder.build_at(dummy_model_hash(), &ledger, &hdag, 1_700_000_002);

        // Rewrite the referenced block in place; same index, new hash.
        let replacement = crate::types::Block::seal(
            1,
            1_700_000_050,
            ledger.blocks()[0].hash,
            Vec::new(),
        );
        ledger.blocks_mut()[1] = replacement;

        assert_eq!(
            builder.verify(&capsule, &ledger, &hdag),
            CapsuleVerdict::StaleReference
        );
    }

    #[test]
    fn hdag_mutation_yields_stale_reference() {
        let (ledger, mut hdag) = sample_state();
        let builder = CapsuleBuilder;
        let capsule = builder.build_at(dummy_model_hash(), &ledger, &hdag, 1_700_000_002);

        hdag.add_node("drift", Vector::from_slice(&[0.1, 0.2, 0.3]));
        assert_eq!(
            builder.verify(&capsule, &ledger, &hdag),
            CapsuleVerdict::StaleReference
        );
    }

    #[test]
    fn new_blocks_do_not_invalidate_existing_capsules() {
        let (mut ledger, hdag) = sample_state();
        let builder = CapsuleBuilder;
        let capsule = builder.build_at(dummy_model_hash(), &ledger, &hdag, 1_700_000_002);

        // Appending is fine: the referenced block is still present and
        // unchanged even though it is no longer the tip.
        ledger.create_block_at(1_700_000_003);
        assert_eq!(
            builder.verify(&capsule, &ledger, &hdag),
            CapsuleVerdict::Valid
        );
    }

    #[test]
    fn representation_round_trips_through_json() {
        let (ledger, hdag) = sample_state();
        let capsule = CapsuleBuilder.build_at(dummy_model_hash(), &ledger, &hdag, 1_700_000_002);

        let json = serde_json::to_string(&capsule).unwrap();
        let back: Capsule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, capsule);
        assert_eq!(back.compute_id(), back.id);
    }
}
