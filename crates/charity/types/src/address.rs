use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding;

/// Account identity on the asset ledger.
///
/// Donors, guardians, recipients, pool creators and administrators are all
/// addresses. A pool's own account is an address too, wrapped in a
/// [`PoolHandle`] so the two cannot be confused at call sites.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(#[serde(with = "encoding")] [u8; 32]);

impl Address {
    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive an address deterministically from a human-readable label.
    ///
    /// The same label always yields the same address. Intended for fixtures,
    /// scripted simulations and operator tooling.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"charity-address-v1:");
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Access the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short display form (first 8 bytes hex).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&encoding::encode(&self.0))
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.short_id())
    }
}

/// Failure to parse a hex address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address {input:?}: {reason}")]
pub struct AddressParseError {
    pub input: String,
    pub reason: String,
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        encoding::decode(s)
            .map(Self)
            .map_err(|e| AddressParseError {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Stable handle of a pool instance.
///
/// The handle is also the pool's account on the asset ledger: donations are
/// pulled into it and withdrawals are pushed out of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolHandle(Address);

impl PoolHandle {
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Derive the handle of the `nonce`-th pool a factory creates for `creator`.
    ///
    /// Distinct `(factory, creator, nonce)` triples give distinct handles, and
    /// the domain tag keeps handles apart from label-derived addresses.
    pub fn derive(factory: &Address, creator: &Address, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"charity-pool-handle-v1:");
        hasher.update(factory.as_bytes());
        hasher.update(creator.as_bytes());
        hasher.update(&nonce.to_be_bytes());
        Self(Address::from_bytes(*hasher.finalize().as_bytes()))
    }

    /// The pool's account address.
    pub fn address(&self) -> &Address {
        &self.0
    }
}

impl std::fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pool:{}", self.0.short_id())
    }
}

impl std::fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PoolHandle({})", self.0.short_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(Address::derive("G1"), Address::derive("G1"));
        assert_ne!(Address::derive("G1"), Address::derive("G2"));
    }

    #[test]
    fn display_parses_back() {
        let addr = Address::derive("donor");
        let shown = addr.to_string();
        assert!(shown.starts_with("0x"));
        assert_eq!(shown.len(), 66);
        assert_eq!(shown.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-an-address".parse::<Address>().unwrap_err();
        assert_eq!(err.input, "not-an-address");
    }

    #[test]
    fn address_serializes_as_hex_string() {
        let addr = Address::derive("R");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let restored: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, addr);
    }

    #[test]
    fn pool_handles_differ_by_nonce_and_creator() {
        let factory = Address::derive("factory");
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");

        let a0 = PoolHandle::derive(&factory, &alice, 0);
        let a1 = PoolHandle::derive(&factory, &alice, 1);
        let b0 = PoolHandle::derive(&factory, &bob, 0);

        assert_ne!(a0, a1);
        assert_ne!(a0, b0);
        assert_eq!(a0, PoolHandle::derive(&factory, &alice, 0));
    }

    #[test]
    fn handle_display_is_short() {
        let handle = PoolHandle::new(Address::derive("p"));
        assert!(handle.to_string().starts_with("pool:"));
        assert_eq!(handle.to_string().len(), "pool:".len() + 16);
    }
}
