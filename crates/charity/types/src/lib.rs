//! # charity-types
//!
//! Shared vocabulary for guardian-governed donation pools:
//!
//! - **Identities**: [`Address`] for donors, guardians, recipients and
//!   administrators; [`PoolHandle`] for a pool's own account
//! - **Identifiers**: [`ProposalId`], the opaque [`ReceiptTag`] attached to
//!   withdrawals, and the informational [`ReceiptId`] issued per donation
//! - **Events**: the append-only records a pool and a factory emit
//! - **Errors**: every precondition failure a pool operation can report
//!
//! ## Invariants carried by these types
//!
//! - Addresses, handles and receipt ids are 32-byte BLAKE3 digests under a
//!   per-kind domain-separation tag, so values of different kinds never collide.
//! - Events carry enough fields to rebuild donation totals and proposal
//!   history from the log alone.

#![deny(unsafe_code)]

mod encoding;

pub mod address;
pub mod error;
pub mod event;
pub mod ids;

pub use address::{Address, AddressParseError, PoolHandle};
pub use error::{CharityError, TransferError};
pub use event::{EventRecord, FactoryEvent, FactoryRecord, PoolEvent};
pub use ids::{Amount, AssetId, ProposalId, ReceiptId, ReceiptTag};
