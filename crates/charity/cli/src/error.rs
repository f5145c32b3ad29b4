//! CLI error types

use charity_factory::FactoryError;
use charity_types::{AddressParseError, CharityError, TransferError};
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Address in config or script could not be parsed
    #[error(transparent)]
    Address(#[from] AddressParseError),

    /// `0x`-prefixed receipt tag that is not 64 hex digits
    #[error("invalid receipt tag {0:?}: expected 64 hex digits")]
    InvalidTag(String),

    /// Script referred to a pool it never created
    #[error("Script references pool #{0}, which was not created")]
    UnknownPool(usize),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Charity(#[from] CharityError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl CliError {
    /// Stable code reported in simulation outcomes.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "Config",
            CliError::Io(_) => "Io",
            CliError::Json(_) => "Json",
            CliError::Address(_) => "InvalidAddress",
            CliError::InvalidTag(_) => "InvalidTag",
            CliError::UnknownPool(_) => "UnknownPool",
            CliError::Factory(FactoryError::Pool(e)) | CliError::Charity(e) => e.code(),
            CliError::Factory(FactoryError::Unauthorized { .. }) => "Unauthorized",
            CliError::Factory(FactoryError::UnknownPool(_)) => "UnknownPool",
            CliError::Transfer(_) => "TransferFailed",
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
