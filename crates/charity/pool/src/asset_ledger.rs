//! Asset ledger collaborator: the token-movement service pools call into.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use charity_types::{Address, Amount, AssetId, TransferError};
use tracing::{debug, warn};

/// External fungible-token ledger.
///
/// Implementations must conserve value: a successful transfer debits the
/// source and credits the destination by the same amount, and a failed
/// transfer moves nothing. A transfer whose source and destination are the
/// same account must fail, so a pool can never receive from itself.
pub trait AssetLedger: Send + Sync {
    /// Current balance of `account` in `asset`.
    fn balance_of(&self, asset: &AssetId, account: &Address) -> Result<Amount, TransferError>;

    /// Move `amount` from a payer into a pool account.
    fn pull(
        &self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError>;

    /// Move `amount` out of the pool's own account to a payee.
    fn push(
        &self,
        asset: &AssetId,
        pool: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError>;
}

/// In-process asset ledger backed by a balance table.
///
/// Every transfer runs under one write lock, so its debit and credit are
/// applied together or not at all.
pub struct InMemoryAssetLedger {
    balances: RwLock<HashMap<(AssetId, Address), Amount>>,
    injected_failures: AtomicUsize,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            injected_failures: AtomicUsize::new(0),
        }
    }

    /// Credit `account` with freshly issued tokens.
    pub fn mint(&self, asset: &AssetId, account: &Address, amount: Amount) -> Result<(), TransferError> {
        let mut balances = self
            .balances
            .write()
            .map_err(|_| TransferError::LockPoisoned)?;
        let entry = balances.entry((asset.clone(), *account)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected(format!("minting {amount} {asset} overflows")))?;
        debug!(asset = %asset, account = %account.short_id(), amount, "Minted");
        Ok(())
    }

    /// Make the next `count` transfers (pull or push) fail with
    /// [`TransferError::Rejected`] without moving funds.
    pub fn fail_next_transfers(&self, count: usize) {
        self.injected_failures.store(count, Ordering::SeqCst);
    }

    /// Sum of all balances held in `asset`.
    pub fn total_supply(&self, asset: &AssetId) -> Result<Amount, TransferError> {
        let balances = self
            .balances
            .read()
            .map_err(|_| TransferError::LockPoisoned)?;
        Ok(balances
            .iter()
            .filter(|((a, _), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum())
    }

    fn take_injected_failure(&self) -> bool {
        self.injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn transfer(
        &self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        if from == to {
            warn!(asset = %asset, account = %from.short_id(), amount, "Self-transfer rejected");
            return Err(TransferError::Rejected(format!(
                "source and destination are both {}",
                from.short_id()
            )));
        }
        if self.take_injected_failure() {
            warn!(asset = %asset, amount, "Transfer rejected by injected failure");
            return Err(TransferError::Rejected("injected failure".into()));
        }

        let mut balances = self
            .balances
            .write()
            .map_err(|_| TransferError::LockPoisoned)?;

        let from_key = (asset.clone(), *from);
        let available = balances.get(&from_key).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                asset: asset.clone(),
                account: *from,
                requested: amount,
                available,
            });
        }
        let to_key = (asset.clone(), *to);
        let credited = balances
            .get(&to_key)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected(format!("crediting {amount} {asset} overflows")))?;

        balances.insert(from_key, available - amount);
        balances.insert(to_key, credited);

        debug!(
            asset = %asset,
            from = %from.short_id(),
            to = %to.short_id(),
            amount,
            "Transfer settled"
        );
        Ok(())
    }
}

impl Default for InMemoryAssetLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn balance_of(&self, asset: &AssetId, account: &Address) -> Result<Amount, TransferError> {
        let balances = self
            .balances
            .read()
            .map_err(|_| TransferError::LockPoisoned)?;
        Ok(balances
            .get(&(asset.clone(), *account))
            .copied()
            .unwrap_or(0))
    }

    fn pull(
        &self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.transfer(asset, from, to, amount)
    }

    fn push(
        &self,
        asset: &AssetId,
        pool: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TransferError> {
        self.transfer(asset, pool, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> AssetId {
        AssetId::new("USDC")
    }

    #[test]
    fn pull_moves_funds() {
        let ledger = InMemoryAssetLedger::new();
        let donor = Address::derive("D");
        let pool = Address::derive("pool");
        ledger.mint(&usdc(), &donor, 100).unwrap();

        ledger.pull(&usdc(), &donor, &pool, 30).unwrap();

        assert_eq!(ledger.balance_of(&usdc(), &donor).unwrap(), 70);
        assert_eq!(ledger.balance_of(&usdc(), &pool).unwrap(), 30);
        assert_eq!(ledger.total_supply(&usdc()).unwrap(), 100);
    }

    #[test]
    fn insufficient_funds_moves_nothing() {
        let ledger = InMemoryAssetLedger::new();
        let donor = Address::derive("D");
        let pool = Address::derive("pool");
        ledger.mint(&usdc(), &donor, 10).unwrap();

        let err = ledger.pull(&usdc(), &donor, &pool, 11).unwrap_err();
        assert!(matches!(
            err,
            TransferError::InsufficientFunds {
                requested: 11,
                available: 10,
                ..
            }
        ));
        assert_eq!(ledger.balance_of(&usdc(), &donor).unwrap(), 10);
        assert_eq!(ledger.balance_of(&usdc(), &pool).unwrap(), 0);
    }

    #[test]
    fn balances_are_per_asset() {
        let ledger = InMemoryAssetLedger::new();
        let donor = Address::derive("D");
        ledger.mint(&usdc(), &donor, 5).unwrap();
        assert_eq!(ledger.balance_of(&AssetId::new("DAI"), &donor).unwrap(), 0);
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let ledger = InMemoryAssetLedger::new();
        let pool = Address::derive("pool");
        let payee = Address::derive("R");
        ledger.mint(&usdc(), &pool, 50).unwrap();
        ledger.fail_next_transfers(1);

        assert!(matches!(
            ledger.push(&usdc(), &pool, &payee, 20),
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(ledger.balance_of(&usdc(), &pool).unwrap(), 50);

        ledger.push(&usdc(), &pool, &payee, 20).unwrap();
        assert_eq!(ledger.balance_of(&usdc(), &payee).unwrap(), 20);
    }

    #[test]
    fn self_transfer_is_rejected() {
        let ledger = InMemoryAssetLedger::new();
        let pool = Address::derive("pool");
        ledger.mint(&usdc(), &pool, 50).unwrap();
        ledger.fail_next_transfers(1);

        assert!(matches!(
            ledger.pull(&usdc(), &pool, &pool, 20),
            Err(TransferError::Rejected(_))
        ));
        assert!(matches!(
            ledger.push(&usdc(), &pool, &pool, 20),
            Err(TransferError::Rejected(_))
        ));
        assert_eq!(ledger.balance_of(&usdc(), &pool).unwrap(), 50);

        // Self-transfers do not consume injected failures.
        assert!(ledger.push(&usdc(), &pool, &Address::derive("R"), 20).is_err());
        assert_eq!(ledger.balance_of(&usdc(), &pool).unwrap(), 50);
    }

    #[test]
    fn mint_overflow_is_rejected() {
        let ledger = InMemoryAssetLedger::new();
        let account = Address::derive("whale");
        ledger.mint(&usdc(), &account, Amount::MAX).unwrap();
        assert!(ledger.mint(&usdc(), &account, 1).is_err());
        assert_eq!(ledger.balance_of(&usdc(), &account).unwrap(), Amount::MAX);
    }
}
