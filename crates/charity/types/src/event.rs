//! Append-only records emitted by pools and factories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::{Address, PoolHandle};
use crate::ids::{Amount, ProposalId, ReceiptId, ReceiptTag};

/// Events emitted by a single pool, in commit order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PoolEvent {
    /// A donation was pulled into the pool.
    Donated {
        donor: Address,
        amount: Amount,
        receipt_id: ReceiptId,
    },
    /// A guardian opened a withdrawal proposal (and approved it implicitly).
    WithdrawalProposed {
        proposal_id: ProposalId,
        proposer: Address,
        to: Address,
        amount: Amount,
        receipt_tag: ReceiptTag,
    },
    /// A further guardian approved an open proposal.
    WithdrawalApproved {
        proposal_id: ProposalId,
        guardian: Address,
    },
    /// Quorum was reached and the funds left the pool.
    Withdrawn {
        proposal_id: ProposalId,
        to: Address,
        amount: Amount,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::Donated { .. } => "Donated",
            PoolEvent::WithdrawalProposed { .. } => "WithdrawalProposed",
            PoolEvent::WithdrawalApproved { .. } => "WithdrawalApproved",
            PoolEvent::Withdrawn { .. } => "Withdrawn",
        }
    }

    /// The proposal this event belongs to, if any.
    pub fn proposal_id(&self) -> Option<ProposalId> {
        match self {
            PoolEvent::Donated { .. } => None,
            PoolEvent::WithdrawalProposed { proposal_id, .. }
            | PoolEvent::WithdrawalApproved { proposal_id, .. }
            | PoolEvent::Withdrawn { proposal_id, .. } => Some(*proposal_id),
        }
    }
}

/// A pool event with its position in the pool's log.
///
/// Sequence numbers start at 1 and have no gaps; failed operations never
/// consume one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    pub pool: PoolHandle,
    pub recorded_at: DateTime<Utc>,
    pub event: PoolEvent,
}

/// Events emitted by a pool factory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FactoryEvent {
    CharityCreated {
        pool_handle: PoolHandle,
        creator: Address,
    },
}

/// A factory event with its position in the factory's log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryRecord {
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: FactoryEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_event_is_tagged_by_type() {
        let event = PoolEvent::Withdrawn {
            proposal_id: ProposalId::new(3),
            to: Address::derive("R"),
            amount: 60,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Withdrawn");
        assert_eq!(json["proposal_id"], 3);
        assert_eq!(json["amount"], 60);

        let restored: PoolEvent = serde_json::from_value(json).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn proposal_id_is_exposed_for_withdrawal_events() {
        let donated = PoolEvent::Donated {
            donor: Address::derive("D"),
            amount: 1,
            receipt_id: ReceiptId::derive(
                &Address::derive("p"),
                &Address::derive("D"),
                1,
                DateTime::<Utc>::default(),
            ),
        };
        assert_eq!(donated.proposal_id(), None);
        assert_eq!(donated.name(), "Donated");

        let approved = PoolEvent::WithdrawalApproved {
            proposal_id: ProposalId::FIRST,
            guardian: Address::derive("G2"),
        };
        assert_eq!(approved.proposal_id(), Some(ProposalId::FIRST));
    }

    #[test]
    fn charity_created_serializes() {
        let event = FactoryEvent::CharityCreated {
            pool_handle: PoolHandle::new(Address::derive("pool")),
            creator: Address::derive("creator"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"CharityCreated\""));
        let restored: FactoryEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }
}
