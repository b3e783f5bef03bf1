//! Trust stack library crate.
//!
//! This crate provides the core building blocks of the integrity
//! pipeline:
//!
//! - strongly-typed domain types (`types`),
//! - an append-only, hash-linked ledger (`ledger`),
//! - a hyperdimensional DAG of feature vectors (`hdag`),
//! - temporal integrity capsules (`capsule`),
//! - a commitment-based proof layer (`proof`),
//! - a model seam for scalar predictions (`model`),
//! - the Spiral orchestrator tying the stages together
//!   (`orchestrator`),
//! - and a top-level node configuration (`config`).
//!
//! Higher-level binaries can compose these pieces to build audit nodes,
//! simulators, and experiment harnesses.

pub mod capsule;
pub mod config;
pub mod hdag;
pub mod ledger;
pub mod model;
pub mod orchestrator;
pub mod proof;
pub mod types;

// Re-export top-level configuration types.
pub use config::{IngestConfig, StackConfig};

// Re-export the core pipeline pieces.
pub use capsule::{BlockRef, Capsule, CapsuleBuilder, CapsuleVerdict};
pub use hdag::{DimensionMismatch, Edge, Hdag, HdagError, HdagRepr, NodeRepr, Vector};
pub use ledger::{ChainInvalid, InvalidReason, Ledger, LedgerRepr};
pub use model::{MeanPositive, Model};
pub use orchestrator::{
    Event, EventOutcome, OrchestratorConfig, Spiral, Stage, StageError, StageErrorKind,
    SubmitOptions, spiral_point,
};
pub use proof::{CommitmentScheme, Proof, ProofBackend, ProofRepr, Witness};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the default orchestrator stack used by a "typical" node.
///
/// This composes:
///
/// - [`MeanPositive`] as the placeholder model, and
/// - [`CommitmentScheme`] as the placeholder proof backend.
pub type DefaultSpiral = Spiral<MeanPositive, CommitmentScheme>;
