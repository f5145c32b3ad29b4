use std::sync::Arc;

use charity_types::{
    Address, Amount, AssetId, CharityError, EventRecord, PoolEvent, PoolHandle, ProposalId,
    ReceiptId, ReceiptTag,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::asset_ledger::AssetLedger;
use crate::clock::Clock;
use crate::donations::DonationLedger;
use crate::proposals::{Proposal, ProposalState, ProposalStore};
use crate::registry::GuardianRegistry;
use crate::withdrawal::{self, Payout};

/// Immutable configuration a pool is initialized with.
#[derive(Clone, Debug)]
pub struct PoolInit {
    pub handle: PoolHandle,
    pub creator: Address,
    pub donation_asset: AssetId,
    pub registry: GuardianRegistry,
    pub template_version: u32,
}

/// One charity: donation ledger, guardian registry, proposal store and the
/// withdrawal state machine over them.
///
/// Every mutating call is a transaction. Changes are staged, the external
/// transfer runs, and only then are the staged changes and their events
/// committed. A failed call leaves the pool exactly as it was.
pub struct CharityPool {
    handle: PoolHandle,
    creator: Address,
    donation_asset: AssetId,
    template_version: u32,
    registry: GuardianRegistry,
    donations: DonationLedger,
    proposals: ProposalStore,
    events: Vec<EventRecord>,
    ledger: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
}

impl CharityPool {
    pub fn new(init: PoolInit, ledger: Arc<dyn AssetLedger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            handle: init.handle,
            creator: init.creator,
            donation_asset: init.donation_asset,
            template_version: init.template_version,
            registry: init.registry,
            donations: DonationLedger::new(),
            proposals: ProposalStore::new(),
            events: Vec::new(),
            ledger,
            clock,
        }
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Pull `amount` of the donation asset from `donor` into the pool.
    ///
    /// Returns the receipt id recorded in the `Donated` event.
    pub fn donate(&mut self, donor: Address, amount: Amount) -> Result<ReceiptId, CharityError> {
        if amount == 0 {
            warn!(pool = %self.handle, donor = %donor.short_id(), "Donation rejected: zero amount");
            return Err(CharityError::ZeroAmount);
        }

        let staged = self.donations.stage(donor, amount)?;
        let at = self.clock.now();

        self.ledger
            .pull(&self.donation_asset, &donor, self.handle.address(), amount)
            .map_err(|e| {
                warn!(pool = %self.handle, donor = %donor.short_id(), amount, error = %e, "Donation pull failed");
                CharityError::from(e)
            })?;

        let receipt_id = ReceiptId::derive(self.handle.address(), &donor, amount, at);
        self.donations.commit(staged);
        self.record(
            at,
            PoolEvent::Donated {
                donor,
                amount,
                receipt_id,
            },
        );

        info!(
            pool = %self.handle,
            donor = %donor.short_id(),
            amount,
            total = self.donations.total(),
            receipt = %receipt_id,
            "Donation accepted"
        );
        Ok(receipt_id)
    }

    /// Open a withdrawal proposal as guardian `caller`.
    ///
    /// The caller's approval is recorded with the proposal. If that alone
    /// meets the threshold the transfer runs inside this call and the
    /// proposal is stored already executed; if the transfer fails nothing is
    /// stored.
    pub fn propose_withdrawal(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        receipt_tag: ReceiptTag,
    ) -> Result<ProposalId, CharityError> {
        let now = self.clock.now();
        let staged = withdrawal::stage_proposal(
            &self.registry,
            &self.proposals,
            caller,
            to,
            amount,
            receipt_tag,
            now,
            || self.balance(),
        )
        .inspect_err(|e| {
            warn!(pool = %self.handle, caller = %caller.short_id(), amount, error = %e, "Proposal rejected");
        })?;

        let mut proposal = staged.proposal;
        if let Some(payout) = &staged.payout {
            self.pay_out(payout)?;
            proposal.mark_executed(now);
        }

        let id = proposal.id();
        self.proposals.insert(proposal);
        self.record(
            now,
            PoolEvent::WithdrawalProposed {
                proposal_id: id,
                proposer: caller,
                to,
                amount,
                receipt_tag,
            },
        );
        info!(pool = %self.handle, proposal_id = %id, proposer = %caller.short_id(), amount, "Withdrawal proposed");

        if let Some(payout) = staged.payout {
            self.record_withdrawn(now, payout);
        }
        Ok(id)
    }

    /// Approve proposal `id` as guardian `caller`.
    ///
    /// When this approval reaches the threshold the transfer runs in the
    /// same call. Returns the proposal's state after the call.
    pub fn approve_withdrawal(
        &mut self,
        caller: Address,
        id: ProposalId,
    ) -> Result<ProposalState, CharityError> {
        let staged = withdrawal::stage_approval(&self.registry, &self.proposals, caller, id)
            .inspect_err(|e| {
                warn!(pool = %self.handle, proposal_id = %id, caller = %caller.short_id(), error = %e, "Approval rejected");
            })?;

        let now = self.clock.now();
        if let Some(payout) = &staged.payout {
            self.pay_out(payout)?;
        }

        let executed_at = staged.payout.as_ref().map(|_| now);
        self.proposals
            .commit_approvals(staged.proposal_id, staged.approvals, executed_at);
        self.record(
            now,
            PoolEvent::WithdrawalApproved {
                proposal_id: id,
                guardian: caller,
            },
        );
        debug!(pool = %self.handle, proposal_id = %id, guardian = %caller.short_id(), "Withdrawal approved");

        match staged.payout {
            Some(payout) => {
                self.record_withdrawn(now, payout);
                Ok(ProposalState::Executed)
            }
            None => Ok(ProposalState::Open),
        }
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn handle(&self) -> PoolHandle {
        self.handle
    }

    pub fn creator(&self) -> &Address {
        &self.creator
    }

    pub fn donation_asset(&self) -> &AssetId {
        &self.donation_asset
    }

    pub fn template_version(&self) -> u32 {
        self.template_version
    }

    /// Cumulative amount donated by `donor`.
    pub fn donated_by(&self, donor: &Address) -> Amount {
        self.donations.donated_by(donor)
    }

    pub fn total_donations(&self) -> Amount {
        self.donations.total()
    }

    /// Every donor with their cumulative contribution.
    pub fn donors(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.donations.iter()
    }

    pub fn guardians(&self) -> &[Address] {
        self.registry.guardians()
    }

    pub fn is_guardian(&self, address: &Address) -> bool {
        self.registry.is_guardian(address)
    }

    pub fn threshold(&self) -> u32 {
        self.registry.threshold()
    }

    pub fn registry(&self) -> &GuardianRegistry {
        &self.registry
    }

    /// Number of proposals created; also the last assigned proposal id.
    pub fn proposal_count(&self) -> u64 {
        self.proposals.count()
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter()
    }

    pub fn proposal_state(&self, id: ProposalId) -> Option<ProposalState> {
        self.proposals.get(id).map(Proposal::state)
    }

    /// Whether `guardian` has approved proposal `id`.
    pub fn has_approved(&self, id: ProposalId, guardian: &Address) -> bool {
        match (self.proposals.get(id), self.registry.index_of(guardian)) {
            (Some(proposal), Some(index)) => proposal.approvals().contains(index),
            _ => false,
        }
    }

    /// Guardians that approved proposal `id`, in registry order.
    pub fn approvers(&self, id: ProposalId) -> Vec<Address> {
        self.proposals
            .get(id)
            .map(|proposal| {
                proposal
                    .approvals()
                    .indices()
                    .filter_map(|index| self.registry.guardian_at(index).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pool balance of the donation asset, read from the asset ledger.
    pub fn balance(&self) -> Result<Amount, CharityError> {
        Ok(self
            .ledger
            .balance_of(&self.donation_asset, self.handle.address())?)
    }

    /// The pool's event log in commit order.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Serializable snapshot of the pool's public state.
    pub fn summary(&self) -> Result<PoolSummary, CharityError> {
        Ok(PoolSummary {
            handle: self.handle,
            creator: self.creator,
            donation_asset: self.donation_asset.clone(),
            template_version: self.template_version,
            guardians: self.registry.guardians().to_vec(),
            threshold: self.registry.threshold(),
            total_donations: self.donations.total(),
            balance: self.balance()?,
            proposals: self
                .proposals
                .iter()
                .map(|p| ProposalSummary {
                    id: p.id(),
                    proposer: *p.proposer(),
                    recipient: *p.recipient(),
                    amount: p.amount(),
                    receipt_tag: *p.receipt_tag(),
                    approved_by: self.approvers(p.id()),
                    approval_count: p.approval_count(),
                    state: p.state(),
                })
                .collect(),
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn pay_out(&self, payout: &Payout) -> Result<(), CharityError> {
        self.ledger
            .push(
                &self.donation_asset,
                self.handle.address(),
                &payout.to,
                payout.amount,
            )
            .map_err(|e| {
                warn!(
                    pool = %self.handle,
                    proposal_id = %payout.proposal_id,
                    amount = payout.amount,
                    error = %e,
                    "Withdrawal transfer failed; call rolled back"
                );
                CharityError::from(e)
            })
    }

    fn record_withdrawn(&mut self, at: DateTime<Utc>, payout: Payout) {
        self.record(
            at,
            PoolEvent::Withdrawn {
                proposal_id: payout.proposal_id,
                to: payout.to,
                amount: payout.amount,
            },
        );
        info!(
            pool = %self.handle,
            proposal_id = %payout.proposal_id,
            to = %payout.to.short_id(),
            amount = payout.amount,
            "Withdrawal executed"
        );
    }

    fn record(&mut self, at: DateTime<Utc>, event: PoolEvent) {
        let sequence = self.events.len() as u64 + 1;
        self.events.push(EventRecord {
            sequence,
            pool: self.handle,
            recorded_at: at,
            event,
        });
    }
}

impl std::fmt::Debug for CharityPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharityPool")
            .field("handle", &self.handle)
            .field("donation_asset", &self.donation_asset)
            .field("threshold", &self.registry.threshold())
            .field("guardians", &self.registry.len())
            .field("total_donations", &self.donations.total())
            .field("proposals", &self.proposals.count())
            .finish()
    }
}

/// Public state of a pool, for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub handle: PoolHandle,
    pub creator: Address,
    pub donation_asset: AssetId,
    pub template_version: u32,
    pub guardians: Vec<Address>,
    pub threshold: u32,
    pub total_donations: Amount,
    pub balance: Amount,
    pub proposals: Vec<ProposalSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub id: ProposalId,
    pub proposer: Address,
    pub recipient: Address,
    pub amount: Amount,
    pub receipt_tag: ReceiptTag,
    pub approved_by: Vec<Address>,
    pub approval_count: u32,
    pub state: ProposalState,
}
