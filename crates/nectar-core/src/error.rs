//! Error types for the Nectar staking engine.
//!
//! Every variant of [`StakeError`] is a synchronous precondition failure:
//! the offending call aborts with no partial effects and the caller must
//! resubmit. The engine has no internal retry logic. The only error-like
//! condition that is deliberately not an error is the sub-unit dust lost
//! during tax redistribution, which is a rounding policy.

use thiserror::Error;

use crate::types::TokenId;

/// Failures reported by external collaborators (reward vault and stake
/// token ledger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("insufficient vault balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },
    #[error("unknown stake token: {0}")]
    UnknownToken(TokenId),
    #[error("transfer failed: {0}")]
    TransferFailed(String),
}

/// The engine's precondition taxonomy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    /// Caller is not the record owner, the receiver differs from the
    /// owner, or an admin operation came from a non-admin account.
    #[error("unauthorized")]
    Unauthorized,
    /// No live stake record exists for the token.
    #[error("token not staked: {0}")]
    NotStaked(TokenId),
    /// A live stake record already exists for the token.
    #[error("token already staked: {0}")]
    AlreadyStaked(TokenId),
    /// The reward funding ceiling is exhausted and the call requires a
    /// nonzero budget.
    #[error("reward budget exhausted")]
    BudgetExhausted,
    /// An in-place Linear claim was attempted before the minimum staking
    /// duration. Unstaking bypasses this gate.
    #[error("minimum stake duration not met: staked for {staked_for} of {required} heights")]
    DurationNotMet { staked_for: u64, required: u64 },
    /// The pool is administratively halted.
    #[error("pool is paused")]
    Paused,
    /// Malformed administrative parameters.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Reward arithmetic left the representable range. All reward math is
    /// checked; the engine never wraps silently.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    /// An external collaborator call failed.
    #[error("collaborator: {0}")]
    Collaborator(#[from] VaultError),
}
