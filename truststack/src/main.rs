// truststack/src/main.rs

//! Demo node that wires up the trust stack:
//!
//! - one shared ledger and one shared HDAG behind RwLocks,
//! - the Spiral orchestrator with the placeholder model and the
//!   commitment-based proof backend,
//! - an ingest loop that samples the 5D spiral, turns each sample into a
//!   sensor event, and drives it through the pipeline,
//! - a full capsule + proof run every Nth event,
//! - graceful shutdown on Ctrl-C.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use truststack::{
    CommitmentScheme, DefaultSpiral, Event, Hdag, Ledger, MeanPositive, Stage, StackConfig,
    SubmitOptions, Transaction, spiral_point,
};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "truststack=info".to_string()),
        )
        .init();

    if let Err(err) = run_node().await {
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run_node() -> Result<(), String> {
    // For now, just use defaults. Later this can load from a file/CLI/env.
    let cfg = StackConfig::default();

    // ---------------------------
    // Shared state + orchestrator
    // ---------------------------

    let ledger = Arc::new(RwLock::new(Ledger::new()));
    let hdag = Arc::new(RwLock::new(Hdag::new()));

    let spiral = Arc::new(DefaultSpiral::new(
        cfg.orchestrator.clone(),
        ledger,
        hdag,
        MeanPositive,
        CommitmentScheme,
    ));

    tracing::info!(
        tick_secs = cfg.ingest.tick_secs,
        prove_every = cfg.ingest.prove_every,
        max_in_flight = cfg.orchestrator.max_in_flight,
        "starting demo ingest loop"
    );

    // ---------------------------
    // Ingest loop
    // ---------------------------

    let mut tick: u64 = 0;
    let interval = Duration::from_secs(cfg.ingest.tick_secs.max(1));

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_signal() => break,
        }

        tick += 1;
        let theta = tick as f32 * 0.25;
        let vector = spiral_point(theta, 1.0, 0.5, 0.1);

        let tx = Transaction::new()
            .with("sensor", "lumen")
            .with("theta", theta as f64)
            .with("tick", tick as i64);

        let node_id = format!("sample-{tick}");
        let mut event = Event::new(&node_id, vector, tx);
        if tick > 1 {
            // Chain each sample to its predecessor so the graph grows a
            // trajectory, weighted by a fixed link strength.
            event = event.link(&format!("sample-{}", tick - 1), 0.9);
        }

        let options = if tick % cfg.ingest.prove_every == 0 {
            SubmitOptions::full()
        } else {
            SubmitOptions::ingest_only()
        };

        match spiral.submit(event, options) {
            Ok(outcome) => {
                if outcome.stage == Stage::Proved {
                    let capsule = outcome.capsule.as_ref().map(|c| c.id.as_hash().to_hex());
                    tracing::info!(
                        block = outcome.block.index,
                        capsule = capsule.as_deref().unwrap_or("-"),
                        "event proved"
                    );
                } else {
                    tracing::info!(
                        block = outcome.block.index,
                        stage = %outcome.stage,
                        "event ingested"
                    );
                }
            }
            Err(e) => {
                tracing::warn!("event failed: {e}");
            }
        }

        if let Err(e) = spiral.validate_ledger() {
            tracing::error!("ledger validation failed: {e}");
            break;
        }
    }

    tracing::info!("shutting down");
    Ok(())
}

/// Waits for Ctrl-C, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
