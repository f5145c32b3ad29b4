//! # charity-pool
//!
//! One guardian-governed donation pool ("charity"):
//!
//! - **Donation ledger**: per-donor and pool-wide totals, append-only
//! - **Guardian registry**: fixed guardian set and approval threshold
//! - **Proposal store**: arena of withdrawal proposals keyed by id
//! - **Withdrawal state machine**: propose → approve* → execute, executing
//!   in the same call that reaches the threshold
//!
//! Token movement goes through the [`AssetLedger`] collaborator.
//! [`InMemoryAssetLedger`] is a complete in-process implementation.
//!
//! ## Transaction semantics
//!
//! Each mutating call stages its changes, performs the external transfer, and
//! commits only if the transfer succeeded. A failed call leaves balances,
//! approvals, counters and the event log exactly as they were, so a guardian
//! whose approval hit a failed transfer can simply approve again.

#![deny(unsafe_code)]

pub mod approvals;
pub mod asset_ledger;
pub mod clock;
pub mod donations;
pub mod pool;
pub mod proposals;
pub mod registry;
pub mod replay;
pub mod withdrawal;

pub use approvals::ApprovalSet;
pub use asset_ledger::{AssetLedger, InMemoryAssetLedger};
pub use clock::{Clock, FixedClock, SystemClock};
pub use donations::DonationLedger;
pub use pool::{CharityPool, PoolInit, PoolSummary, ProposalSummary};
pub use proposals::{Proposal, ProposalState, ProposalStore};
pub use registry::GuardianRegistry;
pub use replay::{replay, PoolHistory, ProposalHistory};
pub use withdrawal::Payout;
