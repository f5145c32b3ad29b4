use std::collections::HashMap;
use std::sync::Arc;

use charity_pool::{AssetLedger, CharityPool, Clock, GuardianRegistry, PoolInit};
use charity_types::{Address, AssetId, CharityError, FactoryEvent, FactoryRecord, PoolHandle};
use tracing::{info, warn};

use crate::error::{FactoryError, Result};
use crate::template::PoolTemplate;

/// Label the default factory address is derived from.
pub const DEFAULT_FACTORY_LABEL: &str = "charity-factory";

/// Creates charity pools from a shared template.
///
/// Each pool gets its own storage; pools share only the asset ledger and the
/// clock. The factory keeps the pools it created, keyed by handle, in
/// creation order.
pub struct PoolFactory {
    address: Address,
    admin: Address,
    template: PoolTemplate,
    nonce: u64,
    pools: HashMap<PoolHandle, CharityPool>,
    order: Vec<PoolHandle>,
    events: Vec<FactoryRecord>,
    ledger: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
}

impl PoolFactory {
    pub fn new(
        admin: Address,
        template: PoolTemplate,
        ledger: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            address: Address::derive(DEFAULT_FACTORY_LABEL),
            admin,
            template,
            nonce: 0,
            pools: HashMap::new(),
            order: Vec::new(),
            events: Vec::new(),
            ledger,
            clock,
        }
    }

    /// Use `address` as the factory's own address for handle derivation.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Create a pool for `creator` accepting `asset`, governed by
    /// `guardians` with approval `threshold`.
    ///
    /// The guardian configuration is validated before anything is allocated;
    /// a rejected call leaves the factory unchanged.
    pub fn create(
        &mut self,
        creator: Address,
        asset: AssetId,
        guardians: Vec<Address>,
        threshold: u32,
    ) -> Result<PoolHandle> {
        let registry = GuardianRegistry::new(guardians, threshold).inspect_err(|e| {
            warn!(creator = %creator.short_id(), error = %e, "Pool creation rejected");
        })?;

        let next_nonce = self
            .nonce
            .checked_add(1)
            .ok_or(CharityError::ArithmeticOverflow {
                context: "factory nonce",
            })?;
        let handle = PoolHandle::derive(&self.address, &creator, self.nonce);

        let pool = CharityPool::new(
            PoolInit {
                handle,
                creator,
                donation_asset: asset.clone(),
                registry,
                template_version: self.template.version,
            },
            Arc::clone(&self.ledger),
            Arc::clone(&self.clock),
        );

        self.nonce = next_nonce;
        self.pools.insert(handle, pool);
        self.order.push(handle);
        self.events.push(FactoryRecord {
            sequence: self.events.len() as u64 + 1,
            recorded_at: self.clock.now(),
            event: FactoryEvent::CharityCreated {
                pool_handle: handle,
                creator,
            },
        });

        info!(
            pool = %handle,
            creator = %creator.short_id(),
            asset = %asset,
            threshold,
            template_version = self.template.version,
            "Charity pool created"
        );
        Ok(handle)
    }

    /// Replace the template used for pools created from now on.
    pub fn set_template(&mut self, caller: &Address, template: PoolTemplate) -> Result<()> {
        self.ensure_admin(caller)?;
        info!(
            from = self.template.version,
            to = template.version,
            label = %template.label,
            "Pool template replaced"
        );
        self.template = template;
        Ok(())
    }

    /// Hand the administrator role to `new_admin`.
    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> Result<()> {
        self.ensure_admin(caller)?;
        info!(to = %new_admin.short_id(), "Factory admin transferred");
        self.admin = new_admin;
        Ok(())
    }

    pub fn pool(&self, handle: &PoolHandle) -> Result<&CharityPool> {
        self.pools
            .get(handle)
            .ok_or(FactoryError::UnknownPool(*handle))
    }

    pub fn pool_mut(&mut self, handle: &PoolHandle) -> Result<&mut CharityPool> {
        self.pools
            .get_mut(handle)
            .ok_or(FactoryError::UnknownPool(*handle))
    }

    /// Pools in creation order.
    pub fn pools(&self) -> impl Iterator<Item = &CharityPool> {
        self.order.iter().filter_map(|handle| self.pools.get(handle))
    }

    /// Handles in creation order.
    pub fn handles(&self) -> &[PoolHandle] {
        &self.order
    }

    pub fn events(&self) -> &[FactoryRecord] {
        &self.events
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn template(&self) -> &PoolTemplate {
        &self.template
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn ensure_admin(&self, caller: &Address) -> Result<()> {
        if caller != &self.admin {
            warn!(caller = %caller.short_id(), "Admin-only factory call rejected");
            return Err(FactoryError::Unauthorized { caller: *caller });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PoolFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolFactory")
            .field("address", &self.address)
            .field("admin", &self.admin)
            .field("template", &self.template)
            .field("pools", &self.order.len())
            .finish()
    }
}
