//! Append-only, hash-linked ledger.
//!
//! The [`Ledger`] owns the ordered sequence of sealed blocks plus a queue
//! of pending transactions. It always starts from a synthetic genesis
//! block and only ever grows; `validate_chain` is a pure read-only walk
//! that reports the first structurally corrupt index as a typed
//! [`ChainInvalid`], never as a panic.
//!
//! Policy choices (documented, see also DESIGN.md):
//!
//! - `create_block` on an empty pending queue seals an **empty block**
//!   rather than failing.
//! - the digest is BLAKE3-256 over the bincode-2 canonical encoding of
//!   `{index, prev_hash, timestamp, transactions}`.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::types::{Block, BlockHash, Transaction};

/// Reason a chain failed validation, attached to the offending index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvalidReason {
    /// The block's `index` field does not match its chain position.
    IndexMismatch,
    /// The genesis block's `prev_hash` is not the zero sentinel.
    GenesisPrevHash,
    /// `prev_hash` does not equal the hash of the preceding block.
    BrokenLink,
    /// The stored hash does not match the recomputed content hash.
    HashMismatch,
}

/// Structural corruption detected by [`Ledger::validate_chain`].
///
/// Carries the first offending chain index and the reason; validation
/// stops at the first failure so callers get a deterministic report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChainInvalid {
    pub at_index: u64,
    pub reason: InvalidReason,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::IndexMismatch => write!(f, "index does not match chain position"),
            InvalidReason::GenesisPrevHash => write!(f, "genesis prev_hash is not the sentinel"),
            InvalidReason::BrokenLink => write!(f, "prev_hash does not match preceding block"),
            InvalidReason::HashMismatch => write!(f, "stored hash does not match recomputation"),
        }
    }
}

impl fmt::Display for ChainInvalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain invalid at index {}: {}", self.at_index, self.reason)
    }
}

impl std::error::Error for ChainInvalid {}

/// Exchange representation of a whole ledger (chain + pending queue).
///
/// This is the contract consumed by dashboard/API collaborators; it is a
/// plain serde value and carries no logic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerRepr {
    pub chain: Vec<Block>,
    pub pending: Vec<Transaction>,
}

/// Append-only ledger with a pending transaction queue.
///
/// One `Ledger` instance exclusively owns its chain; shared access across
/// threads goes through an outer lock (the orchestrator wraps it in an
/// `RwLock`, writers exclusive).
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl Ledger {
    /// Creates a ledger with a genesis block stamped at the current time.
    pub fn new() -> Self {
        Self::with_genesis_timestamp(unix_timestamp())
    }

    /// Creates a ledger with a genesis block at a fixed timestamp.
    ///
    /// Useful for deterministic replay and tests: the same genesis
    /// timestamp and the same sealed content reproduce the same hashes.
    pub fn with_genesis_timestamp(timestamp: u64) -> Self {
        Self {
            chain: vec![Block::genesis(timestamp)],
            pending: Vec::new(),
        }
    }

    /// Appends a transaction to the pending queue.
    ///
    /// Never fails on well-formed input; O(1) amortized.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    /// Seals all pending transactions into a new block at the current time.
    ///
    /// An empty pending queue seals an empty block (documented policy).
    /// Returns a clone of the newly appended block.
    pub fn create_block(&mut self) -> Block {
        self.create_block_at(unix_timestamp())
    }

    /// Seals all pending transactions into a new block at `timestamp`.
    pub fn create_block_at(&mut self, timestamp: u64) -> Block {
        let prev_hash = self.tip().hash;
        let index = self.chain.len() as u64;
        let transactions = std::mem::take(&mut self.pending);

        let block = Block::seal(index, timestamp, prev_hash, transactions);
        self.chain.push(block.clone());
        block
    }

    /// Walks the chain once and reports the first corrupt index, if any.
    ///
    /// Checks, per block: the index matches the chain position, the link
    /// to the preceding block holds (or the genesis sentinel is intact),
    /// and the stored hash equals the recomputed content hash. Read-only.
    pub fn validate_chain(&self) -> Result<(), ChainInvalid> {
        let mut prev: Option<&Block> = None;

        for (position, block) in self.chain.iter().enumerate() {
            let at_index = position as u64;

            if block.index != at_index {
                return Err(ChainInvalid {
                    at_index,
                    reason: InvalidReason::IndexMismatch,
                });
            }

            match prev {
                None => {
                    if block.prev_hash != BlockHash::sentinel() {
                        return Err(ChainInvalid {
                            at_index,
                            reason: InvalidReason::GenesisPrevHash,
                        });
                    }
                }
                Some(prev_block) => {
                    if block.prev_hash != prev_block.hash {
                        return Err(ChainInvalid {
                            at_index,
                            reason: InvalidReason::BrokenLink,
                        });
                    }
                }
            }

            if block.compute_hash() != block.hash {
                return Err(ChainInvalid {
                    at_index,
                    reason: InvalidReason::HashMismatch,
                });
            }

            prev = Some(block);
        }

        Ok(())
    }

    /// Returns the most recently sealed block.
    ///
    /// The chain is never empty (genesis is always present).
    pub fn tip(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always contains the genesis block")
    }

    /// Fetches a sealed block by its chain index, if present.
    pub fn block_by_index(&self, index: u64) -> Option<&Block> {
        self.chain.get(index as usize)
    }

    /// Returns the number of sealed blocks, genesis included.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` if only the genesis block has been sealed.
    pub fn is_empty(&self) -> bool {
        self.chain.len() == 1
    }

    /// Returns the number of pending (not yet sealed) transactions.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Serializes the whole chain and pending queue for exchange.
    pub fn to_representation(&self) -> LedgerRepr {
        LedgerRepr {
            chain: self.chain.clone(),
            pending: self.pending.clone(),
        }
    }

    /// Direct access to the sealed chain, oldest first. Read-only.
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.chain
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the current wall-clock time as seconds since Unix epoch.
///
/// On error (system clock before epoch) this falls back to 0.
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}
