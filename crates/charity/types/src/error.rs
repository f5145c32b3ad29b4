use thiserror::Error;

use crate::address::Address;
use crate::ids::{Amount, AssetId, ProposalId};

/// Failures reported by the external asset ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient {asset} funds in {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        asset: AssetId,
        account: Address,
        requested: Amount,
        available: Amount,
    },

    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error("asset ledger lock poisoned")]
    LockPoisoned,
}

/// Precondition failures of pool operations.
///
/// Every variant aborts the call that raised it with no state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CharityError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("{caller} is not a guardian of this pool")]
    NotGuardian { caller: Address },

    #[error("invalid guardian configuration: {reason}")]
    InvalidGuardianConfiguration { reason: String },

    #[error("unknown proposal: {0}")]
    UnknownProposal(ProposalId),

    #[error("{0} has already been executed")]
    AlreadyExecuted(ProposalId),

    #[error("{guardian} has already approved {proposal_id}")]
    AlreadyApproved {
        proposal_id: ProposalId,
        guardian: Address,
    },

    #[error("insufficient pool balance at proposal time: requested {requested}, available {available}")]
    InsufficientBalanceAtProposalTime { requested: Amount, available: Amount },

    #[error("external transfer failed: {0}")]
    ExternalTransferFailed(#[from] TransferError),

    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow { context: &'static str },
}

impl CharityError {
    /// Stable machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            CharityError::ZeroAmount => "ZeroAmount",
            CharityError::NotGuardian { .. } => "NotGuardian",
            CharityError::InvalidGuardianConfiguration { .. } => "InvalidGuardianConfiguration",
            CharityError::UnknownProposal(_) => "UnknownProposal",
            CharityError::AlreadyExecuted(_) => "AlreadyExecuted",
            CharityError::AlreadyApproved { .. } => "AlreadyApproved",
            CharityError::InsufficientBalanceAtProposalTime { .. } => {
                "InsufficientBalanceAtProposalTime"
            }
            CharityError::ExternalTransferFailed(_) => "ExternalTransferFailed",
            CharityError::ArithmeticOverflow { .. } => "ArithmeticOverflow",
        }
    }

    pub fn invalid_guardians(reason: impl Into<String>) -> Self {
        CharityError::InvalidGuardianConfiguration {
            reason: reason.into(),
        }
    }
}
