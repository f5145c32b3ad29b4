use std::collections::HashMap;

use charity_types::{Address, Amount, CharityError};

/// Per-donor contribution totals and the pool-wide total.
///
/// Only ever grows: `total` always equals the sum of all per-donor values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DonationLedger {
    donated: HashMap<Address, Amount>,
    total: Amount,
}

/// Totals computed for a donation that has not been committed yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StagedDonation {
    donor: Address,
    donor_total: Amount,
    pool_total: Amount,
}

impl DonationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the totals after `amount` from `donor`, failing on overflow.
    pub(crate) fn stage(&self, donor: Address, amount: Amount) -> Result<StagedDonation, CharityError> {
        let donor_total = self
            .donated_by(&donor)
            .checked_add(amount)
            .ok_or(CharityError::ArithmeticOverflow {
                context: "donor contribution total",
            })?;
        let pool_total = self
            .total
            .checked_add(amount)
            .ok_or(CharityError::ArithmeticOverflow {
                context: "pool donation total",
            })?;
        Ok(StagedDonation {
            donor,
            donor_total,
            pool_total,
        })
    }

    pub(crate) fn commit(&mut self, staged: StagedDonation) {
        self.donated.insert(staged.donor, staged.donor_total);
        self.total = staged.pool_total;
    }

    pub fn donated_by(&self, donor: &Address) -> Amount {
        self.donated.get(donor).copied().unwrap_or(0)
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn donor_count(&self) -> usize {
        self.donated.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.donated.iter().map(|(donor, amount)| (donor, *amount))
    }
}
