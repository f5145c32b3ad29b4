//! Rebuild donation totals and proposal history from a pool's event log.

use std::collections::{BTreeMap, HashMap};

use charity_types::{Address, Amount, CharityError, EventRecord, PoolEvent, ProposalId, ReceiptTag};
use serde::Serialize;

use crate::proposals::ProposalState;

/// Pool state reconstructed from events alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolHistory {
    pub donated: HashMap<Address, Amount>,
    pub total_donations: Amount,
    pub total_withdrawn: Amount,
    pub proposals: BTreeMap<ProposalId, ProposalHistory>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProposalHistory {
    pub proposer: Address,
    pub recipient: Address,
    pub amount: Amount,
    pub receipt_tag: ReceiptTag,
    /// Approving guardians in approval order, proposer first.
    pub approved_by: Vec<Address>,
    pub state: ProposalState,
}

impl PoolHistory {
    /// Net amount that should still sit in the pool.
    pub fn retained(&self) -> Amount {
        self.total_donations.saturating_sub(self.total_withdrawn)
    }
}

/// Replay `events` in order.
///
/// Fails with [`CharityError::UnknownProposal`] when an approval or
/// withdrawal refers to a proposal the log never opened, and with
/// [`CharityError::ArithmeticOverflow`] if totals overflow.
pub fn replay<'a>(events: impl IntoIterator<Item = &'a EventRecord>) -> Result<PoolHistory, CharityError> {
    let mut history = PoolHistory::default();

    for record in events {
        match &record.event {
            PoolEvent::Donated { donor, amount, .. } => {
                let entry = history.donated.entry(*donor).or_insert(0);
                *entry = entry.checked_add(*amount).ok_or(CharityError::ArithmeticOverflow {
                    context: "replayed donor total",
                })?;
                history.total_donations = history.total_donations.checked_add(*amount).ok_or(
                    CharityError::ArithmeticOverflow {
                        context: "replayed pool total",
                    },
                )?;
            }
            PoolEvent::WithdrawalProposed {
                proposal_id,
                proposer,
                to,
                amount,
                receipt_tag,
            } => {
                history.proposals.insert(
                    *proposal_id,
                    ProposalHistory {
                        proposer: *proposer,
                        recipient: *to,
                        amount: *amount,
                        receipt_tag: *receipt_tag,
                        approved_by: vec![*proposer],
                        state: ProposalState::Open,
                    },
                );
            }
            PoolEvent::WithdrawalApproved {
                proposal_id,
                guardian,
            } => {
                history
                    .proposals
                    .get_mut(proposal_id)
                    .ok_or(CharityError::UnknownProposal(*proposal_id))?
                    .approved_by
                    .push(*guardian);
            }
            PoolEvent::Withdrawn {
                proposal_id,
                amount,
                ..
            } => {
                history
                    .proposals
                    .get_mut(proposal_id)
                    .ok_or(CharityError::UnknownProposal(*proposal_id))?
                    .state = ProposalState::Executed;
                history.total_withdrawn = history.total_withdrawn.checked_add(*amount).ok_or(
                    CharityError::ArithmeticOverflow {
                        context: "replayed withdrawal total",
                    },
                )?;
            }
        }
    }

    Ok(history)
}
