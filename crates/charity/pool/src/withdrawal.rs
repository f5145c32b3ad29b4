//! Withdrawal state machine: propose → approve* → execute.
//!
//! The functions here only *stage* transitions. They read the guardian
//! registry and the proposal store, validate preconditions and return the
//! values the pool will commit once the external transfer (if any) has
//! succeeded. Nothing is written to pool storage from this module, so a
//! failed transfer is rolled back by dropping the staged value.

use charity_types::{Address, Amount, CharityError, ProposalId, ReceiptTag};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::approvals::ApprovalSet;
use crate::proposals::{Proposal, ProposalStore};
use crate::registry::GuardianRegistry;

/// Funds to push out of the pool when a proposal reaches quorum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub proposal_id: ProposalId,
    pub to: Address,
    pub amount: Amount,
}

/// A proposal ready to be stored, with its payout when the proposer's own
/// approval already meets the threshold.
#[derive(Debug)]
pub(crate) struct StagedProposal {
    pub proposal: Proposal,
    pub payout: Option<Payout>,
}

/// An approval ready to be committed over an open proposal.
#[derive(Debug)]
pub(crate) struct StagedApproval {
    pub proposal_id: ProposalId,
    pub approvals: ApprovalSet,
    pub payout: Option<Payout>,
}

/// Stage a new withdrawal proposal by guardian `caller`.
///
/// Preconditions, in order: caller is a guardian, `amount > 0`, and
/// `amount` does not exceed the pool balance reported by `balance` at call
/// time. The balance is read only after the cheaper checks pass.
#[allow(clippy::too_many_arguments)]
pub(crate) fn stage_proposal(
    registry: &GuardianRegistry,
    store: &ProposalStore,
    caller: Address,
    to: Address,
    amount: Amount,
    receipt_tag: ReceiptTag,
    now: DateTime<Utc>,
    balance: impl FnOnce() -> Result<Amount, CharityError>,
) -> Result<StagedProposal, CharityError> {
    let index = registry
        .index_of(&caller)
        .ok_or(CharityError::NotGuardian { caller })?;

    if amount == 0 {
        return Err(CharityError::ZeroAmount);
    }

    let available = balance()?;
    if amount > available {
        return Err(CharityError::InsufficientBalanceAtProposalTime {
            requested: amount,
            available,
        });
    }

    let id = store.next_id().ok_or(CharityError::ArithmeticOverflow {
        context: "proposal counter",
    })?;

    let mut approvals = ApprovalSet::with_guardians(registry.len());
    approvals.insert(index);

    let payout = reaches_quorum(registry, &approvals).then_some(Payout {
        proposal_id: id,
        to,
        amount,
    });

    debug!(
        proposal_id = %id,
        amount,
        available,
        executes_immediately = payout.is_some(),
        "Withdrawal proposal staged"
    );

    Ok(StagedProposal {
        proposal: Proposal::new(id, caller, to, amount, receipt_tag, approvals, now),
        payout,
    })
}

/// Stage guardian `caller`'s approval of proposal `id`.
///
/// Preconditions, in order: caller is a guardian, the proposal exists, it
/// has not been executed, and the caller has not approved it yet. The payout
/// is taken from the stored proposal, never from caller input.
pub(crate) fn stage_approval(
    registry: &GuardianRegistry,
    store: &ProposalStore,
    caller: Address,
    id: ProposalId,
) -> Result<StagedApproval, CharityError> {
    let index = registry
        .index_of(&caller)
        .ok_or(CharityError::NotGuardian { caller })?;

    let proposal = store.get(id).ok_or(CharityError::UnknownProposal(id))?;

    if proposal.is_executed() {
        return Err(CharityError::AlreadyExecuted(id));
    }

    let mut approvals = proposal.approvals().clone();
    if !approvals.insert(index) {
        return Err(CharityError::AlreadyApproved {
            proposal_id: id,
            guardian: caller,
        });
    }

    let payout = reaches_quorum(registry, &approvals).then_some(Payout {
        proposal_id: id,
        to: *proposal.recipient(),
        amount: proposal.amount(),
    });

    debug!(
        proposal_id = %id,
        approvals = approvals.len(),
        threshold = registry.threshold(),
        "Withdrawal approval staged"
    );

    Ok(StagedApproval {
        proposal_id: id,
        approvals,
        payout,
    })
}

fn reaches_quorum(registry: &GuardianRegistry, approvals: &ApprovalSet) -> bool {
    approvals.len() >= registry.threshold()
}
