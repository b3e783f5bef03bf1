//! Spiral: the pipeline orchestrator.
//!
//! The orchestrator wires together:
//!
//! - a [`Ledger`] for persistence,
//! - an [`Hdag`] for feature projection,
//! - a [`CapsuleBuilder`] for state capture, and
//! - a [`ProofBackend`] plus [`Model`] for the proof layer.
//!
//! Each inbound event moves through the stages
//! `Received → Persisted → Projected → [Capsuled] → [Proved]`; a stage
//! failure halts that event with a typed [`StageError`] naming the stage,
//! and never rolls back state already committed by earlier stages.
//!
//! The orchestrator owns no persistent state of its own: the ledger and
//! graph are held behind explicit `Arc<RwLock<_>>` handles injected at
//! construction (writers exclusive, readers concurrent). Admission is
//! bounded by `max_in_flight`; when the bound is hit, `submit` rejects
//! with [`StageErrorKind::Overload`] instead of buffering (documented
//! policy: reject, not defer).

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::capsule::{Capsule, CapsuleBuilder, CapsuleVerdict};
use crate::hdag::{Hdag, HdagError, Vector};
use crate::ledger::{ChainInvalid, Ledger};
use crate::model::Model;
use crate::proof::{Proof, ProofBackend, Witness};
use crate::types::{Block, Transaction};

/// Orchestrator tuning knobs.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Upper bound on events being processed at once. Submissions beyond
    /// this bound are rejected with [`StageErrorKind::Overload`].
    pub max_in_flight: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_in_flight: 64 }
    }
}

/// Pipeline stages an event moves through.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    Persisted,
    Projected,
    Capsuled,
    Proved,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Persisted => "persisted",
            Stage::Projected => "projected",
            Stage::Capsuled => "capsuled",
            Stage::Proved => "proved",
        };
        write!(f, "{name}")
    }
}

/// What went wrong inside a stage.
#[derive(Clone, Debug, PartialEq)]
pub enum StageErrorKind {
    /// The in-flight bound was reached; the event was rejected, not queued.
    Overload,
    /// A ledger/graph lock was poisoned by a panicking writer.
    LockPoisoned,
    /// The ledger reported structural corruption.
    Chain(ChainInvalid),
    /// A graph operation failed (unknown node, dimension mismatch).
    Graph(HdagError),
    /// A capsule failed verification with the given verdict.
    Capsule(CapsuleVerdict),
    /// The freshly committed proof failed its own verification.
    ProofRejected,
}

/// Typed per-event failure, naming the stage that halted the event.
///
/// State committed by earlier stages (sealed blocks, projected nodes)
/// stays committed; the failure is per-event, not global.
#[derive(Clone, Debug, PartialEq)]
pub struct StageError {
    pub stage: Stage,
    pub kind: StageErrorKind,
}

impl StageError {
    fn new(stage: Stage, kind: StageErrorKind) -> Self {
        Self { stage, kind }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} failed: ", self.stage)?;
        match &self.kind {
            StageErrorKind::Overload => write!(f, "pipeline at capacity, event rejected"),
            StageErrorKind::LockPoisoned => write!(f, "state lock poisoned"),
            StageErrorKind::Chain(e) => write!(f, "{e}"),
            StageErrorKind::Graph(e) => write!(f, "{e}"),
            StageErrorKind::Capsule(v) => write!(f, "capsule verdict: {v}"),
            StageErrorKind::ProofRejected => write!(f, "committed proof failed verification"),
        }
    }
}

impl std::error::Error for StageError {}

/// One inbound event: a transaction plus its feature projection.
#[derive(Clone, Debug)]
pub struct Event {
    /// HDAG node the event projects to (insert-or-replace).
    pub node_id: String,
    /// Feature vector stored under `node_id`.
    pub vector: Vector,
    /// Transaction persisted to the ledger.
    pub transaction: Transaction,
    /// Outgoing `(target, weight)` edges to append after projection.
    ///
    /// Targets must already exist in the graph; an unknown target halts
    /// the event at [`Stage::Projected`].
    pub links: Vec<(String, f32)>,
}

impl Event {
    /// Creates an event with no edges.
    pub fn new(node_id: &str, vector: Vector, transaction: Transaction) -> Self {
        Self {
            node_id: node_id.to_string(),
            vector,
            transaction,
            links: Vec::new(),
        }
    }

    /// Appends an outgoing edge to add after the node is projected.
    pub fn link(mut self, target: &str, weight: f32) -> Self {
        self.links.push((target.to_string(), weight));
        self
    }
}

/// Which optional stages to run for a submission.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubmitOptions {
    /// Capture a capsule after projection.
    pub build_capsule: bool,
    /// Commit a proof over the capsule (implies `build_capsule`).
    pub prove: bool,
}

impl SubmitOptions {
    /// Persist and project only.
    pub fn ingest_only() -> Self {
        Self::default()
    }

    /// Run the full pipeline through [`Stage::Proved`].
    pub fn full() -> Self {
        Self {
            build_capsule: true,
            prove: true,
        }
    }
}

/// Result of a successful submission: the furthest stage reached and the
/// artifacts produced along the way.
#[derive(Clone, Debug)]
pub struct EventOutcome {
    pub stage: Stage,
    pub block: Block,
    pub capsule: Option<Capsule>,
    pub proof: Option<Proof>,
}

// Releases an admission slot when the event finishes, error or not.
struct InFlightSlot<'a>(&'a AtomicUsize);

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The orchestrator.
///
/// Generic over the injected [`Model`] and [`ProofBackend`] so the proof
/// layer can be swapped without touching the pipeline.
pub struct Spiral<M, B> {
    config: OrchestratorConfig,
    ledger: Arc<RwLock<Ledger>>,
    hdag: Arc<RwLock<Hdag>>,
    builder: CapsuleBuilder,
    model: M,
    backend: B,
    in_flight: AtomicUsize,
}

impl<M, B> Spiral<M, B>
where
    M: Model,
    B: ProofBackend,
{
    /// Creates an orchestrator over the given ledger and graph handles.
    pub fn new(
        config: OrchestratorConfig,
        ledger: Arc<RwLock<Ledger>>,
        hdag: Arc<RwLock<Hdag>>,
        model: M,
        backend: B,
    ) -> Self {
        Self {
            config,
            ledger,
            hdag,
            builder: CapsuleBuilder,
            model,
            backend,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Returns a handle to the shared ledger.
    pub fn ledger(&self) -> Arc<RwLock<Ledger>> {
        Arc::clone(&self.ledger)
    }

    /// Returns a handle to the shared graph.
    pub fn hdag(&self) -> Arc<RwLock<Hdag>> {
        Arc::clone(&self.hdag)
    }

    /// Drives one event through the pipeline.
    ///
    /// `Received → Persisted → Projected`, then optionally `Capsuled` and
    /// `Proved` per `options`. Fails fast with a [`StageError`] naming
    /// the stage that halted the event.
    pub fn submit(&self, event: Event, options: SubmitOptions) -> Result<EventOutcome, StageError> {
        let _slot = self.admit()?;

        // Persisted: seal the transaction into a fresh block.
        let block = {
            let mut ledger = self
                .ledger
                .write()
                .map_err(|_| StageError::new(Stage::Persisted, StageErrorKind::LockPoisoned))?;
            ledger.add_transaction(event.transaction.clone());
            ledger.create_block()
        };
        tracing::debug!(
            index = block.index,
            hash = %block.hash.0.to_hex(),
            "event persisted"
        );

        // Projected: update the graph from the confirmed content.
        {
            let mut hdag = self
                .hdag
                .write()
                .map_err(|_| StageError::new(Stage::Projected, StageErrorKind::LockPoisoned))?;
            hdag.add_node(&event.node_id, event.vector.clone());
            for (target, weight) in &event.links {
                hdag.add_edge(&event.node_id, target, *weight)
                    .map_err(|e| StageError::new(Stage::Projected, StageErrorKind::Graph(e)))?;
            }
        }
        tracing::debug!(node = %event.node_id, "event projected");

        if !options.build_capsule && !options.prove {
            return Ok(EventOutcome {
                stage: Stage::Projected,
                block,
                capsule: None,
                proof: None,
            });
        }

        // Capsuled: capture the post-projection state.
        let capsule = self.build_capsule()?;
        tracing::debug!(capsule = %capsule.id.as_hash().to_hex(), "event capsuled");

        if !options.prove {
            return Ok(EventOutcome {
                stage: Stage::Capsuled,
                block,
                capsule: Some(capsule),
                proof: None,
            });
        }

        // Proved: bind the model prediction to the capsule.
        let proof = self.prove(&capsule, &event.vector)?;
        tracing::info!(
            capsule = %capsule.id.as_hash().to_hex(),
            blob = %proof.proof_blob.to_hex(),
            "event proved"
        );

        Ok(EventOutcome {
            stage: Stage::Proved,
            block,
            capsule: Some(capsule),
            proof: Some(proof),
        })
    }

    /// Captures a capsule of the current ledger tip and graph digest.
    ///
    /// Both read locks are held across the capture, so the capsule never
    /// observes a torn state.
    pub fn build_capsule(&self) -> Result<Capsule, StageError> {
        let ledger = self
            .ledger
            .read()
            .map_err(|_| StageError::new(Stage::Capsuled, StageErrorKind::LockPoisoned))?;
        let hdag = self
            .hdag
            .read()
            .map_err(|_| StageError::new(Stage::Capsuled, StageErrorKind::LockPoisoned))?;

        let capsule = self
            .builder
            .build(self.model.params_hash(), &ledger, &hdag);

        let verdict = self.builder.verify(&capsule, &ledger, &hdag);
        if !verdict.is_valid() {
            return Err(StageError::new(
                Stage::Capsuled,
                StageErrorKind::Capsule(verdict),
            ));
        }
        Ok(capsule)
    }

    /// Commits a proof that the model yields its prediction for `input`
    /// under `capsule`.
    ///
    /// The capsule is re-verified against the live structures first, so a
    /// stale or tampered capsule is refused before any proof exists.
    pub fn prove(&self, capsule: &Capsule, input: &Vector) -> Result<Proof, StageError> {
        {
            let ledger = self
                .ledger
                .read()
                .map_err(|_| StageError::new(Stage::Proved, StageErrorKind::LockPoisoned))?;
            let hdag = self
                .hdag
                .read()
                .map_err(|_| StageError::new(Stage::Proved, StageErrorKind::LockPoisoned))?;

            let verdict = self.builder.verify(capsule, &ledger, &hdag);
            if !verdict.is_valid() {
                return Err(StageError::new(
                    Stage::Proved,
                    StageErrorKind::Capsule(verdict),
                ));
            }
        }

        let prediction = self.model.predict(input);
        let proof = self.backend.commit(capsule, input, prediction);

        // Self-check: the commitment we just produced must verify.
        let witness = Witness {
            input: input.clone(),
            model_params: capsule.model_hash,
            capsule: capsule.id,
        };
        let commitment = self.backend.witness_commitment(&witness);
        if !self
            .backend
            .verify(&proof.statement, &proof.proof_blob, &commitment)
        {
            return Err(StageError::new(Stage::Proved, StageErrorKind::ProofRejected));
        }

        Ok(proof)
    }

    /// Read-only chain validation through the shared handle.
    pub fn validate_ledger(&self) -> Result<(), StageError> {
        let ledger = self
            .ledger
            .read()
            .map_err(|_| StageError::new(Stage::Persisted, StageErrorKind::LockPoisoned))?;
        ledger
            .validate_chain()
            .map_err(|e| StageError::new(Stage::Persisted, StageErrorKind::Chain(e)))
    }

    fn admit(&self) -> Result<InFlightSlot<'_>, StageError> {
        let max = self.config.max_in_flight;
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max).then_some(n + 1)
            })
            .map(|_| InFlightSlot(&self.in_flight))
            .map_err(|_| StageError::new(Stage::Received, StageErrorKind::Overload))
    }
}

/// Samples a point on the five-dimensional spiral the orchestrator is
/// named after.
///
/// `a` scales the first two dimensions, `b` the third and fourth (at
/// twice the angular frequency), and `c` the linear fifth dimension.
/// The demo binary uses this to generate feature vectors.
pub fn spiral_point(theta: f32, a: f32, b: f32, c: f32) -> Vector {
    Vector::new(vec![
        a * theta.cos(),
        a * theta.sin(),
        b * (2.0 * theta).cos(),
        b * (2.0 * theta).sin(),
        c * theta,
    ])
}
