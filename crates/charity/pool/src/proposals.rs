use charity_types::{Address, Amount, ProposalId, ReceiptTag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::approvals::ApprovalSet;

/// Lifecycle state of a withdrawal proposal.
///
/// `Open` until quorum is reached and the transfer succeeds, then `Executed`
/// forever. Proposals never expire and cannot be cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Open,
    Executed,
}

/// A withdrawal proposal and its approval record.
///
/// Recipient, amount and receipt tag are fixed when the proposal is created;
/// only the approval set and the executed marker change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    proposer: Address,
    recipient: Address,
    amount: Amount,
    receipt_tag: ReceiptTag,
    approvals: ApprovalSet,
    executed: bool,
    created_at: DateTime<Utc>,
    executed_at: Option<DateTime<Utc>>,
}

impl Proposal {
    pub(crate) fn new(
        id: ProposalId,
        proposer: Address,
        recipient: Address,
        amount: Amount,
        receipt_tag: ReceiptTag,
        approvals: ApprovalSet,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            proposer,
            recipient,
            amount,
            receipt_tag,
            approvals,
            executed: false,
            created_at,
            executed_at: None,
        }
    }

    pub(crate) fn mark_executed(&mut self, at: DateTime<Utc>) {
        self.executed = true;
        self.executed_at = Some(at);
    }

    pub fn id(&self) -> ProposalId {
        self.id
    }

    pub fn proposer(&self) -> &Address {
        &self.proposer
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn receipt_tag(&self) -> &ReceiptTag {
        &self.receipt_tag
    }

    pub fn approvals(&self) -> &ApprovalSet {
        &self.approvals
    }

    /// Number of distinct guardians that approved; always the size of the
    /// approval set.
    pub fn approval_count(&self) -> u32 {
        self.approvals.len()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn state(&self) -> ProposalState {
        if self.executed {
            ProposalState::Executed
        } else {
            ProposalState::Open
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }
}

/// Arena of proposals indexed by `id - 1`.
///
/// Proposals are appended in id order and never removed; executed ones stay
/// as the audit record.
#[derive(Clone, Debug, Default)]
pub struct ProposalStore {
    proposals: Vec<Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of proposals ever created; also the last allocated id.
    pub fn count(&self) -> u64 {
        self.proposals.len() as u64
    }

    /// The id the next stored proposal will receive.
    pub fn next_id(&self) -> Option<ProposalId> {
        self.count().checked_add(1).map(ProposalId::new)
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        Self::slot(id).and_then(|slot| self.proposals.get(slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter()
    }

    /// Append a staged proposal. Its id must be [`ProposalStore::next_id`].
    pub(crate) fn insert(&mut self, proposal: Proposal) {
        debug_assert_eq!(Some(proposal.id), self.next_id());
        self.proposals.push(proposal);
    }

    /// Replace the approval record of an open proposal with a staged one,
    /// executing it when `executed_at` is given.
    pub(crate) fn commit_approvals(
        &mut self,
        id: ProposalId,
        approvals: ApprovalSet,
        executed_at: Option<DateTime<Utc>>,
    ) {
        if let Some(proposal) = Self::slot(id).and_then(|slot| self.proposals.get_mut(slot)) {
            debug_assert!(!proposal.executed);
            proposal.approvals = approvals;
            if let Some(at) = executed_at {
                proposal.mark_executed(at);
            }
        }
    }

    fn slot(id: ProposalId) -> Option<usize> {
        id.get()
            .checked_sub(1)
            .and_then(|slot| usize::try_from(slot).ok())
    }
}
