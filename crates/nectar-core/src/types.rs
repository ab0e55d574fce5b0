//! Core engine types: identifiers, stake records, pool state, events.
//!
//! All reward amounts are in drops (see [`constants`](crate::constants)).
//! All timing values are ledger heights; the engine never consults a
//! wall clock.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a non-fungible stake token.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for TokenId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A 20-byte account identifier.
///
/// The surrounding host authenticates callers; the engine only compares
/// identities. Displayed as lowercase hex.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// The zero account. Not a valid owner; useful as a placeholder.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an AccountId from a byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for AccountId {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Accrual class of a stake token, immutable while staked.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StakeClass {
    /// Time-linear accrual: rewards grow with heights elapsed since the
    /// snapshot, capped by the pool's funding ceiling.
    Linear,
    /// Share-weighted accrual: rewards settle against the global
    /// reward-per-weight accumulator.
    Weighted,
}

impl fmt::Display for StakeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Weighted => write!(f, "weighted"),
        }
    }
}

/// Per-token attributes read from the stake token's metadata store.
///
/// Both fields must be immutable while the token is staked; the pool's
/// aggregate counters assume the values observed at deposit time still
/// hold at claim time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenTraits {
    /// Accrual class.
    pub class: StakeClass,
    /// Share weight. Meaningful for [`StakeClass::Weighted`]; Linear tokens
    /// carry 0.
    pub weight: u64,
}

/// One live stake: created on deposit, snapshot advanced on in-place
/// claims, deleted on unstake.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakeRecord {
    /// The staked token.
    pub token_id: TokenId,
    /// Depositing account. Only this account may claim or unstake, and
    /// payouts may only be directed to it.
    pub owner: AccountId,
    /// Accrual class, fixed for the token's staked lifetime.
    pub class: StakeClass,
    /// Reward snapshot: the deposit/last-claim height for Linear tokens,
    /// the accumulator value at deposit/last claim for Weighted tokens.
    pub snapshot: u64,
}

/// Global pool aggregates: the single shared mutable state of the engine.
///
/// Mutated only by the deposit handler and the claim orchestrator, both of
/// which run serialized. Batch operations mutate a cloned draft and commit
/// it atomically.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolState {
    /// Count of currently staked Linear tokens.
    pub total_linear_staked: u64,
    /// Count of currently staked Weighted tokens.
    pub total_weighted_staked: u64,
    /// Sum of `weight` over all staked Weighted tokens.
    pub total_weight_staked: u64,
    /// Global reward-per-weight accumulator. Never decreases.
    pub accumulator: u64,
    /// Tax received while no weight was staked, carried until the next
    /// redistribution with nonzero weight.
    pub pending_remainder: u64,
    /// Cumulative reward ever credited to Linear stakers. Never decreases
    /// and never exceeds the funding ceiling observed at update time.
    pub total_emitted: u64,
    /// Height at which `total_emitted` last advanced.
    pub last_emission_height: u64,
    /// Administrative halt: deposits and claims are rejected while set.
    pub paused: bool,
}

impl PoolState {
    /// Fresh pool state anchored at `start_height`.
    pub fn new(start_height: u64) -> Self {
        Self {
            total_linear_staked: 0,
            total_weighted_staked: 0,
            total_weight_staked: 0,
            accumulator: 0,
            pending_remainder: 0,
            total_emitted: 0,
            last_emission_height: start_height,
            paused: false,
        }
    }

    /// Reconcile the aggregate counters against the live stake records.
    ///
    /// Returns a description of the first violation found. Used by tests
    /// and the simulation harness after every mutation; the engine itself
    /// maintains the counters incrementally.
    pub fn check_invariants<'a, I>(&self, records: I) -> Result<(), String>
    where
        I: IntoIterator<Item = &'a StakeRecord>,
    {
        let mut linear = 0u64;
        let mut weighted = 0u64;
        for rec in records {
            match rec.class {
                StakeClass::Linear => linear += 1,
                StakeClass::Weighted => weighted += 1,
            }
        }
        if self.total_linear_staked != linear {
            return Err(format!(
                "total_linear_staked {} != live linear records {}",
                self.total_linear_staked, linear
            ));
        }
        if self.total_weighted_staked != weighted {
            return Err(format!(
                "total_weighted_staked {} != live weighted records {}",
                self.total_weighted_staked, weighted
            ));
        }
        Ok(())
    }

    /// Reconcile `total_weight_staked` against the weights of the live
    /// Weighted records.
    ///
    /// Weights live in the stake token's metadata store, so the caller
    /// supplies them (one entry per staked Weighted token).
    pub fn check_weight_invariant<I>(&self, weights: I) -> Result<(), String>
    where
        I: IntoIterator<Item = u64>,
    {
        let total: u64 = weights.into_iter().sum();
        if self.total_weight_staked != total {
            return Err(format!(
                "total_weight_staked {} != sum of live weights {}",
                self.total_weight_staked, total
            ));
        }
        Ok(())
    }
}

/// Observability events, fire-and-forget.
///
/// The engine emits these through an [`EventSink`](crate::traits::EventSink)
/// after internal state has been committed; delivery is not guaranteed and
/// failures never roll the engine back.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum PoolEvent {
    /// A stake token was deposited.
    TokenStaked {
        /// Depositing account.
        owner: AccountId,
        /// The staked token.
        token_id: TokenId,
        /// Initial reward snapshot (height or accumulator value).
        snapshot: u64,
    },
    /// Rewards were claimed for one token.
    Claim {
        /// The settled token.
        token_id: TokenId,
        /// Net amount paid for this token, after tax or forfeiture.
        payout: u64,
        /// Whether the token left the pool in the same call.
        unstaked: bool,
    },
    /// The pool configuration was replaced by the administrator.
    ConfigUpdated,
    /// The administrative pause flag changed.
    PausedSet(bool),
}
