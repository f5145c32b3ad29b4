use std::collections::HashSet;

use charity_types::{Address, CharityError};
use serde::Serialize;

/// Guardian set and approval threshold of one pool.
///
/// Fixed at pool initialization: there is no way to add or remove guardians
/// or change the threshold afterwards. A different guardian set means a new
/// pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuardianRegistry {
    guardians: Vec<Address>,
    threshold: u32,
}

impl GuardianRegistry {
    /// Validate and freeze a guardian set.
    ///
    /// Rejects an empty list, duplicate guardians, a zero threshold and a
    /// threshold larger than the number of guardians.
    pub fn new(guardians: Vec<Address>, threshold: u32) -> Result<Self, CharityError> {
        if guardians.is_empty() {
            return Err(CharityError::invalid_guardians("guardian list is empty"));
        }
        if threshold == 0 {
            return Err(CharityError::invalid_guardians("threshold must be at least 1"));
        }
        if threshold as usize > guardians.len() {
            return Err(CharityError::invalid_guardians(format!(
                "threshold {threshold} exceeds guardian count {}",
                guardians.len()
            )));
        }

        let mut seen = HashSet::with_capacity(guardians.len());
        if let Some(duplicate) = guardians.iter().find(|g| !seen.insert(**g)) {
            return Err(CharityError::invalid_guardians(format!(
                "guardian {duplicate} listed more than once"
            )));
        }

        Ok(Self {
            guardians,
            threshold,
        })
    }

    pub fn is_guardian(&self, address: &Address) -> bool {
        self.guardians.contains(address)
    }

    /// Position of `address` in the guardian list; keys the approval bitset.
    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.guardians.iter().position(|g| g == address)
    }

    /// Guardian at registry position `index`.
    pub fn guardian_at(&self, index: usize) -> Option<&Address> {
        self.guardians.get(index)
    }

    pub fn guardians(&self) -> &[Address] {
        &self.guardians
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.guardians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guardians.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guardians(labels: &[&str]) -> Vec<Address> {
        labels.iter().map(|l| Address::derive(l)).collect()
    }

    #[test]
    fn accepts_threshold_within_bounds() {
        let registry = GuardianRegistry::new(guardians(&["G1", "G2", "G3"]), 2).unwrap();
        assert_eq!(registry.threshold(), 2);
        assert_eq!(registry.len(), 3);
        assert!(registry.is_guardian(&Address::derive("G2")));
        assert!(!registry.is_guardian(&Address::derive("X")));
        assert_eq!(registry.index_of(&Address::derive("G3")), Some(2));
        assert_eq!(registry.guardian_at(0), Some(&Address::derive("G1")));
    }

    #[test]
    fn threshold_may_equal_guardian_count() {
        assert!(GuardianRegistry::new(guardians(&["G1", "G2"]), 2).is_ok());
    }

    #[test]
    fn rejects_empty_list() {
        let err = GuardianRegistry::new(vec![], 1).unwrap_err();
        assert_eq!(err.code(), "InvalidGuardianConfiguration");
    }

    #[test]
    fn rejects_zero_threshold() {
        let err = GuardianRegistry::new(guardians(&["G1"]), 0).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn rejects_threshold_above_count() {
        let err = GuardianRegistry::new(guardians(&["G1", "G2"]), 3).unwrap_err();
        assert!(err.to_string().contains("exceeds guardian count 2"));
    }

    #[test]
    fn rejects_duplicate_guardian() {
        let err = GuardianRegistry::new(guardians(&["G1", "G2", "G1"]), 2).unwrap_err();
        assert!(matches!(err, CharityError::InvalidGuardianConfiguration { .. }));
    }
}
