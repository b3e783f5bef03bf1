//! Top-level configuration for a stack node.
//!
//! This module aggregates configuration for:
//!
//! - the orchestrator (`OrchestratorConfig`),
//! - the demo ingest loop (tick interval, proof cadence).
//!
//! The goal is a single `StackConfig` struct that higher-level binaries
//! (e.g. `main.rs`) can construct from defaults, config files, or
//! environment variables as needed.

use crate::orchestrator::OrchestratorConfig;

/// Configuration for the demo ingest loop.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Seconds between generated events.
    pub tick_secs: u64,
    /// Run the full pipeline (capsule + proof) every Nth event; the rest
    /// stop at projection.
    pub prove_every: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tick_secs: 2,
            prove_every: 5,
        }
    }
}

/// Top-level configuration for a stack node.
#[derive(Clone, Debug, Default)]
pub struct StackConfig {
    pub orchestrator: OrchestratorConfig,
    pub ingest: IngestConfig,
}
