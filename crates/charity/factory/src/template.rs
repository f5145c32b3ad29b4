use serde::{Deserialize, Serialize};

/// Shared pool logic version stamped onto every pool created from it.
///
/// Replacing the factory's template affects pools created afterwards only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTemplate {
    pub version: u32,
    pub label: String,
}

impl PoolTemplate {
    pub fn new(version: u32, label: impl Into<String>) -> Self {
        Self {
            version,
            label: label.into(),
        }
    }
}

impl Default for PoolTemplate {
    fn default() -> Self {
        Self::new(1, "charity-pool")
    }
}
