//! Commitment-based proof layer (ZKML placeholder).
//!
//! The [`ProofBackend`] trait is the stable seam between the pipeline and
//! whatever proves statements about it. The shipped implementation,
//! [`CommitmentScheme`], is **not** a zero-knowledge proof: it commits to
//! a statement and a hidden witness and lets a verifier who can recompute
//! the same witness commitment check that nothing was swapped after the
//! fact. It demonstrates *integrity of disclosure*, not *privacy of the
//! witness* — a real SNARK/STARK backend can replace it behind the same
//! trait without touching the ledger/HDAG/capsule layers.

use serde::{Deserialize, Serialize};

use crate::capsule::Capsule;
use crate::hdag::Vector;
use crate::types::{CapsuleId, Hash256, ModelHash, canonical_bytes};

/// The private witness behind a proof.
///
/// Never serialized into a [`Proof`]; only its commitment is. A verifier
/// who is shown the witness out of band can recompute the commitment and
/// check it against the proof.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Witness {
    /// Raw input vector fed to the model.
    pub input: Vector,
    /// Digest of the model parameters used for the prediction.
    pub model_params: ModelHash,
    /// The capsule the prediction was made under.
    pub capsule: CapsuleId,
}

/// Public output of [`ProofBackend::commit`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// Canonical description of what is claimed.
    pub statement: String,
    /// BLAKE3-256 commitment to the private [`Witness`].
    pub witness_commitment: Hash256,
    /// `blake3(statement_bytes || witness_commitment_bytes)`.
    pub proof_blob: Hash256,
}

/// Exchange representation of a verification result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofRepr {
    pub statement: String,
    pub proof_blob: String,
    pub verified: bool,
}

impl Proof {
    /// Builds the exchange form, recording a verify outcome.
    pub fn to_representation(&self, verified: bool) -> ProofRepr {
        ProofRepr {
            statement: self.statement.clone(),
            proof_blob: self.proof_blob.to_hex(),
            verified,
        }
    }
}

/// Pluggable prover/verifier pair.
///
/// Implementations must be deterministic: committing twice to the same
/// capsule, input, and prediction yields byte-identical proofs, and
/// `verify` must accept exactly the proofs `commit` produces.
pub trait ProofBackend: Send + Sync {
    /// Builds a proof binding `capsule.id` and `prediction`, committing
    /// to the witness (`input`, the capsule's model hash, the capsule
    /// id) without disclosing it.
    fn commit(&self, capsule: &Capsule, input: &Vector, prediction: f32) -> Proof;

    /// Recomputes the commitment for a disclosed witness.
    ///
    /// This is what an independent verifier runs over the witness it was
    /// shown before calling [`ProofBackend::verify`].
    fn witness_commitment(&self, witness: &Witness) -> Hash256;

    /// Succeeds iff `digest(statement || witness_commitment)` equals
    /// `proof_blob`.
    fn verify(&self, statement: &str, proof_blob: &Hash256, witness_commitment: &Hash256) -> bool;
}

/// Canonical body of a statement, serialized with `serde_json`.
///
/// Field order is fixed by the struct definition, so the textual
/// statement is byte-stable for a given capsule id and prediction.
#[derive(Serialize, Deserialize)]
struct StatementBody {
    capsule: String,
    prediction: f32,
}

/// The placeholder hash-commitment scheme.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommitmentScheme;

impl CommitmentScheme {
    /// Builds the canonical statement text for a capsule/prediction pair.
    pub fn statement_for(capsule_id: &CapsuleId, prediction: f32) -> String {
        let body = StatementBody {
            capsule: capsule_id.as_hash().to_hex(),
            prediction,
        };
        serde_json::to_string(&body).expect("statement body should always serialize")
    }

    fn blob(statement: &str, witness_commitment: &Hash256) -> Hash256 {
        let mut bytes = Vec::with_capacity(statement.len() + witness_commitment.0.len());
        bytes.extend_from_slice(statement.as_bytes());
        bytes.extend_from_slice(witness_commitment.as_bytes());
        Hash256::compute(&bytes)
    }
}

impl ProofBackend for CommitmentScheme {
    fn commit(&self, capsule: &Capsule, input: &Vector, prediction: f32) -> Proof {
        let witness = Witness {
            input: input.clone(),
            model_params: capsule.model_hash,
            capsule: capsule.id,
        };
        let witness_commitment = self.witness_commitment(&witness);
        let statement = Self::statement_for(&capsule.id, prediction);
        let proof_blob = Self::blob(&statement, &witness_commitment);

        Proof {
            statement,
            witness_commitment,
            proof_blob,
        }
    }

    fn witness_commitment(&self, witness: &Witness) -> Hash256 {
        Hash256::compute(&canonical_bytes(witness))
    }

    fn verify(&self, statement: &str, proof_blob: &Hash256, witness_commitment: &Hash256) -> bool {
        Self::blob(statement, witness_commitment) == *proof_blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capsule::CapsuleBuilder;
    use crate::hdag::Hdag;
    use crate::ledger::Ledger;
    use crate::types::Transaction;

    fn sample_capsule() -> Capsule {
        let mut ledger = Ledger::with_genesis_timestamp(1_700_000_000);
        ledger.add_transaction(Transaction::new().with("sensor", "lumen"));
        ledger.create_block_at(1_700_000_001);

        let mut hdag = Hdag::new();
        hdag.add_node("sensor", Vector::from_slice(&[1.0, 0.5, 0.1]));

        CapsuleBuilder.build_at(
            ModelHash::from_params(b"test-model-v1"),
            &ledger,
            &hdag,
            1_700_000_002,
        )
    }

    #[test]
    fn commit_then_verify_succeeds() {
        let scheme = CommitmentScheme;
        let capsule = sample_capsule();
        let input = Vector::from_slice(&[1.0, 0.5, 0.1]);

        let proof = scheme.commit(&capsule, &input, 0.5333);

        // A verifier shown the witness recomputes the commitment.
        let witness = Witness {
            input,
            model_params: capsule.model_hash,
            capsule: capsule.id,
        };
        let recomputed = scheme.witness_commitment(&witness);
        assert_eq!(recomputed, proof.witness_commitment);
        assert!(scheme.verify(&proof.statement, &proof.proof_blob, &recomputed));
    }

    #[test]
    fn witness_differing_by_one_value_fails() {
        let scheme = CommitmentScheme;
        let capsule = sample_capsule();
        let input = Vector::from_slice(&[1.0, 0.5, 0.1]);

        let proof = scheme.commit(&capsule, &input, 0.5333);

        let wrong = Witness {
            input: Vector::from_slice(&[1.0, 0.5, 0.100001]),
            model_params: capsule.model_hash,
            capsule: capsule.id,
        };
        let recomputed = scheme.witness_commitment(&wrong);
        assert_ne!(recomputed, proof.witness_commitment);
        assert!(!scheme.verify(&proof.statement, &proof.proof_blob, &recomputed));
    }

    #[test]
    fn tampered_statement_fails() {
        let scheme = CommitmentScheme;
        let capsule = sample_capsule();
        let input = Vector::from_slice(&[1.0]);

        let proof = scheme.commit(&capsule, &input, 1.0);
        let tampered = CommitmentScheme::statement_for(&capsule.id, 2.0);
        assert!(!scheme.verify(&tampered, &proof.proof_blob, &proof.witness_commitment));
    }

    #[test]
    fn commit_is_deterministic() {
        let scheme = CommitmentScheme;
        let capsule = sample_capsule();
        let input = Vector::from_slice(&[0.1, 0.2]);

        let a = scheme.commit(&capsule, &input, 0.25);
        let b = scheme.commit(&capsule, &input, 0.25);
        assert_eq!(a, b);
    }

    #[test]
    fn proof_never_contains_the_raw_witness() {
        let scheme = CommitmentScheme;
        let capsule = sample_capsule();
        let input = Vector::from_slice(&[42.125, -7.5]);

        let proof = scheme.commit(&capsule, &input, 0.0);
        let json = serde_json::to_string(&proof).unwrap();
        assert!(!json.contains("42.125"));
        assert!(!json.contains("-7.5"));
    }

    #[test]
    fn representation_reports_verification_outcome() {
        let scheme = CommitmentScheme;
        let capsule = sample_capsule();
        let proof = scheme.commit(&capsule, &Vector::from_slice(&[1.0]), 1.0);

        let repr = proof.to_representation(true);
        assert!(repr.verified);
        assert_eq!(repr.proof_blob, proof.proof_blob.to_hex());
        assert_eq!(repr.statement, proof.statement);
    }
}
