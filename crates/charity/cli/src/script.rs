//! Scripted simulation against a fresh factory and in-memory asset ledger.
//!
//! A script is a JSON array of operations, each tagged by `op`:
//!
//! ```json
//! [
//!   {"op": "mint", "account": "D", "amount": 100},
//!   {"op": "create_pool", "creator": "alice", "guardians": ["G1", "G2", "G3"], "threshold": 2},
//!   {"op": "donate", "pool": 1, "donor": "D", "amount": 100},
//!   {"op": "propose", "pool": 1, "caller": "G1", "to": "R", "amount": 60, "tag": "T"},
//!   {"op": "approve", "pool": 1, "caller": "G2", "proposal": 1}
//! ]
//! ```
//!
//! Pools are referenced by creation index starting at 1. Addresses and tags
//! are either `0x`-prefixed hex or labels hashed into a value.

use std::path::Path;
use std::sync::Arc;

use charity_factory::{PoolFactory, PoolTemplate};
use charity_pool::{AssetLedger, CharityPool, FixedClock, InMemoryAssetLedger, PoolSummary};
use charity_types::{Address, Amount, AssetId, PoolHandle, ProposalId, ReceiptTag};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Credit `account` on the asset ledger.
    Mint {
        account: String,
        amount: Amount,
        #[serde(default)]
        asset: Option<String>,
    },
    CreatePool {
        creator: String,
        guardians: Vec<String>,
        threshold: u32,
        #[serde(default)]
        asset: Option<String>,
    },
    Donate {
        pool: usize,
        donor: String,
        amount: Amount,
    },
    Propose {
        pool: usize,
        caller: String,
        to: String,
        amount: Amount,
        tag: String,
    },
    Approve {
        pool: usize,
        caller: String,
        proposal: u64,
    },
    /// Make the next `count` ledger transfers fail.
    FailTransfers { count: usize },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Mint { .. } => "mint",
            Operation::CreatePool { .. } => "create_pool",
            Operation::Donate { .. } => "donate",
            Operation::Propose { .. } => "propose",
            Operation::Approve { .. } => "approve",
            Operation::FailTransfers { .. } => "fail_transfers",
        }
    }
}

/// Result of one scripted step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepError {
    pub code: &'static str,
    pub message: String,
}

/// Parse an address given as `0x`-prefixed hex or as a label.
pub fn parse_address(input: &str) -> CliResult<Address> {
    if input.starts_with("0x") {
        Ok(input.parse()?)
    } else {
        Ok(Address::derive(input))
    }
}

/// Parse a receipt tag given as `0x`-prefixed hex or as a label.
pub fn parse_tag(input: &str) -> CliResult<ReceiptTag> {
    if input.starts_with("0x") {
        ReceiptTag::from_hex(input).ok_or_else(|| CliError::InvalidTag(input.to_string()))
    } else {
        Ok(ReceiptTag::derive(input))
    }
}

/// Read a script file.
pub fn load_script(path: &Path) -> CliResult<Vec<Operation>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Runs scripts against one factory and ledger.
pub struct Simulator {
    factory: PoolFactory,
    ledger: Arc<InMemoryAssetLedger>,
    default_asset: AssetId,
}

impl Simulator {
    pub fn new(config: &CliConfig) -> CliResult<Self> {
        let admin = parse_address(&config.factory.admin)?;
        let ledger = Arc::new(InMemoryAssetLedger::new());
        let clock = Arc::new(FixedClock::stepping(
            config.simulation.clock_start_ms,
            config.simulation.clock_step_ms,
        ));
        let template = PoolTemplate::new(
            config.factory.template_version,
            config.factory.template_label.clone(),
        );

        Ok(Self {
            factory: PoolFactory::new(admin, template, ledger.clone(), clock),
            ledger,
            default_asset: AssetId::new(config.simulation.asset.clone()),
        })
    }

    /// Apply every step in order. Failed steps are reported and skipped.
    pub fn run(&mut self, script: &[Operation]) -> Vec<StepOutcome> {
        script
            .iter()
            .enumerate()
            .map(|(index, op)| {
                let step = index + 1;
                match self.apply(op) {
                    Ok(result) => StepOutcome {
                        step,
                        op: op.name(),
                        ok: true,
                        result: Some(result),
                        error: None,
                    },
                    Err(e) => {
                        debug!(step, op = op.name(), error = %e, "Script step failed");
                        StepOutcome {
                            step,
                            op: op.name(),
                            ok: false,
                            result: None,
                            error: Some(StepError {
                                code: e.code(),
                                message: e.to_string(),
                            }),
                        }
                    }
                }
            })
            .collect()
    }

    /// Apply a single step.
    pub fn apply(&mut self, op: &Operation) -> CliResult<Value> {
        match op {
            Operation::Mint {
                account,
                amount,
                asset,
            } => {
                let account = parse_address(account)?;
                let asset = self.asset(asset.as_deref());
                self.ledger.mint(&asset, &account, *amount)?;
                Ok(json!({
                    "account": account,
                    "balance": self.ledger.balance_of(&asset, &account)?,
                }))
            }
            Operation::CreatePool {
                creator,
                guardians,
                threshold,
                asset,
            } => {
                let creator = parse_address(creator)?;
                let guardians = guardians
                    .iter()
                    .map(|g| parse_address(g))
                    .collect::<CliResult<Vec<_>>>()?;
                let asset = self.asset(asset.as_deref());
                let handle = self.factory.create(creator, asset, guardians, *threshold)?;
                Ok(json!({ "pool": self.factory.len(), "handle": handle }))
            }
            Operation::Donate {
                pool,
                donor,
                amount,
            } => {
                let donor = parse_address(donor)?;
                let receipt_id = self.pool_mut(*pool)?.donate(donor, *amount)?;
                Ok(json!({ "receipt_id": receipt_id }))
            }
            Operation::Propose {
                pool,
                caller,
                to,
                amount,
                tag,
            } => {
                let caller = parse_address(caller)?;
                let to = parse_address(to)?;
                let tag = parse_tag(tag)?;
                let pool = self.pool_mut(*pool)?;
                let id = pool.propose_withdrawal(caller, to, *amount, tag)?;
                Ok(json!({ "proposal_id": id, "state": pool.proposal_state(id) }))
            }
            Operation::Approve {
                pool,
                caller,
                proposal,
            } => {
                let caller = parse_address(caller)?;
                let state = self
                    .pool_mut(*pool)?
                    .approve_withdrawal(caller, ProposalId::new(*proposal))?;
                Ok(json!({ "proposal_id": proposal, "state": state }))
            }
            Operation::FailTransfers { count } => {
                self.ledger.fail_next_transfers(*count);
                Ok(json!({ "failing_transfers": count }))
            }
        }
    }

    /// Summaries of every pool, in creation order.
    pub fn summaries(&self) -> CliResult<Vec<PoolSummary>> {
        let summaries = self
            .factory
            .pools()
            .map(|pool| pool.summary())
            .collect::<Result<Vec<_>, _>>()?;
        info!(pools = summaries.len(), "Simulation finished");
        Ok(summaries)
    }

    pub fn factory(&self) -> &PoolFactory {
        &self.factory
    }

    fn asset(&self, name: Option<&str>) -> AssetId {
        name.map(AssetId::new)
            .unwrap_or_else(|| self.default_asset.clone())
    }

    fn handle(&self, index: usize) -> CliResult<PoolHandle> {
        index
            .checked_sub(1)
            .and_then(|i| self.factory.handles().get(i))
            .copied()
            .ok_or(CliError::UnknownPool(index))
    }

    fn pool_mut(&mut self, index: usize) -> CliResult<&mut CharityPool> {
        let handle = self.handle(index)?;
        Ok(self.factory.pool_mut(&handle)?)
    }
}
