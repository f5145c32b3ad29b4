//! Property tests: any random sequence of pool operations keeps the ledger,
//! approval and event-log invariants.

use std::sync::Arc;

use charity_pool::{
    replay, AssetLedger, CharityPool, FixedClock, GuardianRegistry, InMemoryAssetLedger, PoolInit,
    ProposalState,
};
use charity_types::{Address, AssetId, CharityError, PoolHandle, ProposalId, ReceiptTag};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DONORS: [&str; 3] = ["D1", "D2", "D3"];
const GUARDIANS: [&str; 4] = ["G1", "G2", "G3", "G4"];
const OUTSIDER: &str = "X";

#[derive(Clone, Debug)]
enum Op {
    Donate { donor: usize, amount: u64 },
    Propose { caller: usize, amount: u64 },
    Approve { caller: usize, proposal: u64 },
    FailNext,
}

/// Caller indices past the guardian list select the outsider.
fn caller(index: usize) -> Address {
    Address::derive(GUARDIANS.get(index).copied().unwrap_or(OUTSIDER))
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..DONORS.len(), 0u64..200).prop_map(|(donor, amount)| Op::Donate { donor, amount }),
        2 => (0usize..=GUARDIANS.len(), 0u64..250).prop_map(|(caller, amount)| Op::Propose { caller, amount }),
        4 => (0usize..=GUARDIANS.len(), 0u64..8).prop_map(|(caller, proposal)| Op::Approve { caller, proposal }),
        1 => Just(Op::FailNext),
    ]
}

fn usdc() -> AssetId {
    AssetId::new("USDC")
}

fn build(threshold: u32) -> (CharityPool, Arc<InMemoryAssetLedger>) {
    let ledger = Arc::new(InMemoryAssetLedger::new());
    for donor in DONORS {
        ledger.mint(&usdc(), &Address::derive(donor), 1_000).unwrap();
    }
    let registry = GuardianRegistry::new(
        GUARDIANS.iter().map(|g| Address::derive(g)).collect(),
        threshold,
    )
    .unwrap();
    let pool = CharityPool::new(
        PoolInit {
            handle: PoolHandle::new(Address::derive("pool")),
            creator: Address::derive("creator"),
            donation_asset: usdc(),
            registry,
            template_version: 1,
        },
        ledger.clone(),
        Arc::new(FixedClock::stepping(0, 10)),
    );
    (pool, ledger)
}

fn apply(pool: &mut CharityPool, ledger: &InMemoryAssetLedger, op: &Op) -> Result<(), CharityError> {
    match op {
        Op::Donate { donor, amount } => pool
            .donate(Address::derive(DONORS[*donor]), *amount)
            .map(|_| ()),
        Op::Propose { caller: c, amount } => pool
            .propose_withdrawal(caller(*c), Address::derive("R"), *amount, ReceiptTag::derive("T"))
            .map(|_| ()),
        Op::Approve { caller: c, proposal } => pool
            .approve_withdrawal(caller(*c), ProposalId::new(*proposal))
            .map(|_| ()),
        Op::FailNext => {
            ledger.fail_next_transfers(1);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Pool total always equals the sum of per-donor totals.
    #[test]
    fn total_equals_sum_of_donor_totals(
        threshold in 1u32..=4,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let (mut pool, ledger) = build(threshold);
        for op in &ops {
            let _ = apply(&mut pool, &ledger, op);
            let sum: u64 = pool.donors().map(|(_, amount)| amount).sum();
            prop_assert_eq!(pool.total_donations(), sum);
        }
    }

    /// A rejected or failed call leaves summary, ledger balances and event
    /// log exactly as they were.
    #[test]
    fn failed_calls_leave_pool_unchanged(
        threshold in 1u32..=4,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let (mut pool, ledger) = build(threshold);
        for op in &ops {
            let summary_before = pool.summary().unwrap();
            let events_before = pool.events().to_vec();
            let recipient_before = ledger.balance_of(&usdc(), &Address::derive("R")).unwrap();

            if apply(&mut pool, &ledger, op).is_err() {
                prop_assert_eq!(pool.summary().unwrap(), summary_before);
                prop_assert_eq!(pool.events(), events_before.as_slice());
                prop_assert_eq!(
                    ledger.balance_of(&usdc(), &Address::derive("R")).unwrap(),
                    recipient_before
                );
            }
        }
    }

    /// Approval counts match approver sets, only executed proposals reached
    /// the threshold, and ids are contiguous from 1.
    #[test]
    fn approvals_and_execution_are_consistent(
        threshold in 1u32..=4,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let (mut pool, ledger) = build(threshold);
        for op in &ops {
            let _ = apply(&mut pool, &ledger, op);
        }

        let mut expected_id = ProposalId::FIRST;
        for proposal in pool.proposals() {
            prop_assert_eq!(proposal.id(), expected_id);
            expected_id = expected_id.next().unwrap();

            let approvers = pool.approvers(proposal.id());
            prop_assert_eq!(proposal.approval_count() as usize, approvers.len());
            prop_assert!(approvers.contains(proposal.proposer()));
            prop_assert!(approvers.iter().all(|a| pool.is_guardian(a)));

            match proposal.state() {
                ProposalState::Executed => prop_assert!(proposal.approval_count() >= threshold),
                ProposalState::Open => prop_assert!(proposal.approval_count() < threshold),
            }
        }
        prop_assert_eq!(pool.proposal_count(), expected_id.get() - 1);
    }

    /// Funds are conserved: pool balance is donations minus executed payouts,
    /// and the event log replays to the same figures.
    #[test]
    fn balance_matches_replayed_history(
        threshold in 1u32..=4,
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let (mut pool, ledger) = build(threshold);
        for op in &ops {
            let _ = apply(&mut pool, &ledger, op);
        }

        let withdrawn: u64 = pool
            .proposals()
            .filter(|p| p.is_executed())
            .map(|p| p.amount())
            .sum();
        let balance = pool.balance().unwrap();
        prop_assert_eq!(balance, pool.total_donations() - withdrawn);
        prop_assert_eq!(
            ledger.balance_of(&usdc(), &Address::derive("R")).unwrap(),
            withdrawn
        );
        prop_assert_eq!(ledger.total_supply(&usdc()).unwrap(), 3_000);

        let history = replay(pool.events()).unwrap();
        prop_assert_eq!(history.total_donations, pool.total_donations());
        prop_assert_eq!(history.total_withdrawn, withdrawn);
        prop_assert_eq!(history.retained(), balance);
        prop_assert_eq!(history.proposals.len() as u64, pool.proposal_count());
        for (id, entry) in &history.proposals {
            prop_assert_eq!(Some(entry.state), pool.proposal_state(*id));
            prop_assert_eq!(&entry.approved_by.len(), &pool.approvers(*id).len());
        }

        let sequences: Vec<u64> = pool.events().iter().map(|r| r.sequence).collect();
        let expected: Vec<u64> = (1..=pool.events().len() as u64).collect();
        prop_assert_eq!(sequences, expected);
    }
}
