//! Factory error types

use charity_types::{Address, CharityError, PoolHandle};
use thiserror::Error;

/// Factory errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("{caller} is not the factory administrator")]
    Unauthorized { caller: Address },

    #[error("pool not found: {0}")]
    UnknownPool(PoolHandle),

    #[error(transparent)]
    Pool(#[from] CharityError),
}

/// Result type for factory operations
pub type Result<T> = std::result::Result<T, FactoryError>;
