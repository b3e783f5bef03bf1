// truststack/src/types/block.rs

//! Block types and hashing.
//!
//! This module defines the ledger's block structure together with a
//! canonical hashing routine. Serialization is done with **bincode 2**
//! using the `serde` integration (`bincode::serde::encode_to_vec`) and an
//! explicit `standard()` config, via [`canonical_bytes`]. The same
//! canonical encoding is used when a block is sealed and when the chain is
//! re-validated.

use serde::{Deserialize, Serialize};

use super::{Hash256, Transaction, canonical_bytes};

/// Strongly-typed block hash.
///
/// This is the content hash of a [`Block`], computed as a BLAKE3-256
/// digest over the canonical bincode-2 serialization of the block's
/// hashed fields (everything except the stored hash itself).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub Hash256);

impl BlockHash {
    /// Returns the sentinel hash used as the genesis block's `prev_hash`.
    pub fn sentinel() -> Self {
        BlockHash(Hash256::zero())
    }
}

/// Immutable, hash-linked unit of the ledger.
///
/// A block bundles an ordered list of [`Transaction`]s with its position
/// in the chain and the hash of its predecessor. Once sealed, fields never
/// mutate; the only way to "change" history is to discard the whole chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    /// 0-based, monotonically increasing position in the chain.
    pub index: u64,

    /// Wall-clock timestamp of the seal, in seconds since Unix epoch.
    ///
    /// Part of the hashed content, so replayed chains must carry the
    /// original timestamps to reproduce the same hashes.
    pub timestamp: u64,

    /// Hash of the preceding block, or the zero sentinel for genesis.
    pub prev_hash: BlockHash,

    /// Ordered list of transactions sealed into this block.
    pub transactions: Vec<Transaction>,

    /// Content hash of this block.
    ///
    /// A pure function of every other field; see [`Block::compute_hash`].
    pub hash: BlockHash,
}

/// The hashed subset of a block's fields, in canonical order.
///
/// The stored `hash` field is excluded so that the hash is well-defined.
#[derive(Serialize)]
struct HashedFields<'a> {
    index: u64,
    prev_hash: &'a BlockHash,
    timestamp: u64,
    transactions: &'a [Transaction],
}

impl Block {
    /// Seals a new block, computing its content hash from the other fields.
    pub fn seal(
        index: u64,
        timestamp: u64,
        prev_hash: BlockHash,
        transactions: Vec<Transaction>,
    ) -> Self {
        let mut block = Block {
            index,
            timestamp,
            prev_hash,
            transactions,
            hash: BlockHash::sentinel(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Builds the synthetic genesis block at index 0.
    pub fn genesis(timestamp: u64) -> Self {
        Block::seal(0, timestamp, BlockHash::sentinel(), Vec::new())
    }

    /// Returns the canonical byte representation of this block's hashed
    /// fields (`{index, prev_hash, timestamp, transactions}`).
    ///
    /// All hashing and re-validation goes through this method to avoid
    /// format drift between sealing and checking.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_bytes(&HashedFields {
            index: self.index,
            prev_hash: &self.prev_hash,
            timestamp: self.timestamp,
            transactions: &self.transactions,
        })
    }

    /// Recomputes the canonical BLAKE3-256 hash for this block.
    ///
    /// This ignores the stored `hash` field, so it can be compared against
    /// it to detect tampering. Must remain stable across process restarts
    /// and platforms for chain validation to work.
    pub fn compute_hash(&self) -> BlockHash {
        BlockHash(Hash256::compute(&self.canonical_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tx(value: i64) -> Transaction {
        Transaction::new().with("sensor", "lumen").with("value", value)
    }

    #[test]
    fn block_hash_is_deterministic() {
        let block = Block::seal(
            1,
            1_700_000_000,
            BlockHash(Hash256::compute(b"parent")),
            vec![dummy_tx(1337)],
        );

        let h1 = block.compute_hash();
        let h2 = block.compute_hash();
        assert_eq!(h1, h2);
        assert_eq!(block.hash, h1);
    }

    #[test]
    fn stored_hash_is_excluded_from_hashing() {
        let mut block = Block::seal(0, 1_700_000_000, BlockHash::sentinel(), Vec::new());
        let expected = block.compute_hash();

        // Corrupting the stored hash must not change what recomputation
        // yields, only make the stored value disagree with it.
        block.hash = BlockHash(Hash256::compute(b"garbage"));
        assert_eq!(block.compute_hash(), expected);
        assert_ne!(block.hash, expected);
    }

    #[test]
    fn hash_covers_every_sealed_field() {
        let base = Block::seal(2, 1_700_000_000, BlockHash::sentinel(), vec![dummy_tx(1)]);

        let other_index = Block::seal(3, 1_700_000_000, BlockHash::sentinel(), vec![dummy_tx(1)]);
        let other_time = Block::seal(2, 1_700_000_001, BlockHash::sentinel(), vec![dummy_tx(1)]);
        let other_parent = Block::seal(
            2,
            1_700_000_000,
            BlockHash(Hash256::compute(b"p")),
            vec![dummy_tx(1)],
        );
        let other_txs = Block::seal(2, 1_700_000_000, BlockHash::sentinel(), vec![dummy_tx(2)]);

        for other in [other_index, other_time, other_parent, other_txs] {
            assert_ne!(base.hash, other.hash);
        }
    }

    #[test]
    fn genesis_uses_zero_sentinel() {
        let g = Block::genesis(1_700_000_000);
        assert_eq!(g.index, 0);
        assert_eq!(g.prev_hash, BlockHash::sentinel());
        assert!(g.transactions.is_empty());
        assert_eq!(g.hash, g.compute_hash());
    }
}
