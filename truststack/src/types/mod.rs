//! Core domain types shared across the trust stack.
//!
//! This module defines strongly-typed hashes, content identifiers, and the
//! opaque transaction record accepted by the ledger. The goal is to avoid
//! "naked" byte buffers and raw strings in public APIs and instead use
//! domain-specific newtypes.

use serde::{Deserialize, Serialize};

/// Block types and canonical hashing.
pub mod block;

pub use block::{Block, BlockHash};

/// Length in bytes of all 256-bit hash types used in this crate.
pub const HASH_LEN: usize = 32;

/// Strongly-typed 256-bit hash wrapper (BLAKE3-256).
///
/// This type is the backing representation for all fixed-size hashes in the
/// stack (block hashes, HDAG digests, capsule identifiers, witness
/// commitments, proof blobs). It is always exactly [`HASH_LEN`] bytes long.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// Computes a new [`Hash256`] as the BLAKE3-256 hash of `data`.
    ///
    /// The result is deterministic for a given byte slice and is suitable
    /// for use as an identifier or content hash, but it is **not** a
    /// password hash or KDF.
    pub fn compute(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Hash256(*h.as_bytes())
    }

    /// Returns the all-zero hash used as the genesis `prev_hash` sentinel.
    pub fn zero() -> Self {
        Hash256([0u8; HASH_LEN])
    }

    /// Returns the underlying 32-byte hash as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns the lowercase hex encoding of this hash.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Returns the canonical byte encoding of any serializable value.
///
/// This uses **bincode 2** with the `standard()` configuration and the
/// `serde` integration. All hashing in this crate goes through this one
/// encoding so that creation and re-validation always agree byte for byte.
///
/// # Panics
///
/// Panics if encoding fails. This is considered a programming error,
/// because all hashed types are required to be serializable.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    // Explicit config to avoid relying on any implicit defaults.
    let cfg = bincode::config::standard();
    bincode::serde::encode_to_vec(value, cfg)
        .expect("domain types should always be serializable with bincode 2 + serde")
}

/// Digest of a model's parameters, identifying the exact model version.
///
/// `ModelHash` is content-addressed: two models with the same canonical
/// parameter bytes share the same hash.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ModelHash(pub Hash256);

impl ModelHash {
    /// Derives a [`ModelHash`] from the canonical bytes of a model's
    /// parameters.
    pub fn from_params(params: &[u8]) -> Self {
        ModelHash(Hash256::compute(params))
    }

    /// Returns the underlying [`Hash256`].
    pub fn as_hash(&self) -> &Hash256 {
        &self.0
    }
}

/// Content identifier of a capsule.
///
/// Computed as the BLAKE3-256 digest over the canonical encoding of every
/// other capsule field, so any mutation of a capsule changes its id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CapsuleId(pub Hash256);

impl CapsuleId {
    /// Returns the underlying [`Hash256`].
    pub fn as_hash(&self) -> &Hash256 {
        &self.0
    }
}

/// A single value stored under a transaction key.
///
/// The ledger treats values as opaque; this enum only exists so that
/// transactions have a stable canonical encoding for hashing and a
/// JSON-friendly exchange form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TxValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for TxValue {
    fn from(v: bool) -> Self {
        TxValue::Bool(v)
    }
}

impl From<i64> for TxValue {
    fn from(v: i64) -> Self {
        TxValue::Int(v)
    }
}

impl From<f64> for TxValue {
    fn from(v: f64) -> Self {
        TxValue::Float(v)
    }
}

impl From<&str> for TxValue {
    fn from(v: &str) -> Self {
        TxValue::Text(v.to_string())
    }
}

impl From<String> for TxValue {
    fn from(v: String) -> Self {
        TxValue::Text(v)
    }
}

/// One key/value entry of a [`Transaction`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxEntry {
    pub key: String,
    pub value: TxValue,
}

/// An opaque, ordered key/value record supplied by a caller.
///
/// Entries keep their insertion order; the same key may appear more than
/// once (the record is a sequence, not a map). Transactions are immutable
/// once accepted into a block's pending queue, which is enforced by the
/// ledger owning them by value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    entries: Vec<TxEntry>,
}

impl Transaction {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, preserving insertion order. Builder-style.
    pub fn with(mut self, key: &str, value: impl Into<TxValue>) -> Self {
        self.entries.push(TxEntry {
            key: key.to_string(),
            value: value.into(),
        });
        self
    }

    /// Returns the first value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&TxValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Returns the entries in insertion order.
    pub fn entries(&self) -> &[TxEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the transaction has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
