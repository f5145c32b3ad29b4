use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::encoding;

/// Token amount in the asset's smallest unit.
pub type Amount = u64;

/// Identifier of the fungible token a pool accepts (e.g. "USDC").
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Withdrawal proposal identifier, unique within one pool.
///
/// Identifiers are allocated from 1 upwards; the last allocated id equals
/// the pool's proposal count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(u64);

impl ProposalId {
    pub const FIRST: ProposalId = ProposalId(1);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id allocated after this one, `None` on counter exhaustion.
    pub fn next(self) -> Option<ProposalId> {
        self.0.checked_add(1).map(ProposalId)
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proposal#{}", self.0)
    }
}

/// Opaque 256-bit commitment attached to a withdrawal proposal.
///
/// Typically the root of an off-chain receipt tree justifying the spend.
/// Pools record it verbatim and never interpret it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptTag(#[serde(with = "encoding")] [u8; 32]);

impl ReceiptTag {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a tag from 64 hex digits (optionally `0x`-prefixed).
    pub fn from_hex(s: &str) -> Option<Self> {
        encoding::decode(s).ok().map(Self)
    }

    /// Tag derived from a label, for fixtures and scripted runs.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"charity-receipt-tag-v1:");
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ReceiptTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encoding::encode(&self.0))
    }
}

impl std::fmt::Debug for ReceiptTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReceiptTag({})", hex::encode(&self.0[..8]))
    }
}

/// Donation receipt identifier.
///
/// Derived from `(pool, donor, amount, timestamp)` so anyone holding the
/// donation record can recompute it. Informational only: nothing in a pool
/// authorizes against it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptId(#[serde(with = "encoding")] [u8; 32]);

impl ReceiptId {
    pub fn derive(pool: &Address, donor: &Address, amount: Amount, at: DateTime<Utc>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"charity-donation-receipt-v1:");
        hasher.update(pool.as_bytes());
        hasher.update(donor.as_bytes());
        hasher.update(&amount.to_be_bytes());
        hasher.update(&at.timestamp_micros().to_be_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rcpt:{}", hex::encode(&self.0[..8]))
    }
}

impl std::fmt::Debug for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReceiptId({})", hex::encode(&self.0[..8]))
    }
}
