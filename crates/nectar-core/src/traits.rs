//! Collaborator trait interfaces for the Nectar engine.
//!
//! The engine never reimplements its collaborators; it talks to them
//! through these seams:
//! - [`RewardVault`]: the fungible reward token balance held by the pool
//!   (funding ceiling query and payout transfer)
//! - [`StakeTokenLedger`]: the non-fungible stake token (metadata reads
//!   and token-return transfers)
//! - [`CoinFlip`]: the randomness capability behind unstake forfeiture
//! - [`EventSink`]: fire-and-forget observability events
//!
//! In-memory implementations suitable for tests and simulation live here
//! as well; production hosts adapt their real ledgers.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::VaultError;
use crate::types::{AccountId, PoolEvent, TokenId, TokenTraits};

/// The pool's reward-token holdings.
///
/// `balance` doubles as the live funding ceiling for Linear emission: it
/// shrinks with every payout, so emission headroom is a moving target.
pub trait RewardVault: Send {
    /// Current reward-token balance held by the pool, in drops.
    fn balance(&self) -> Result<u64, VaultError>;

    /// Transfer `amount` drops from the pool to `to`.
    fn transfer(&mut self, to: &AccountId, amount: u64) -> Result<(), VaultError>;
}

/// The non-fungible stake token contract.
///
/// Trait values must be immutable while a token is staked; the pool's
/// aggregate weight counter assumes deposit-time weights still hold at
/// claim time.
pub trait StakeTokenLedger: Send {
    /// Read the `(class, weight)` attributes of a token from the metadata
    /// store.
    fn token_traits(&self, id: TokenId) -> Result<TokenTraits, VaultError>;

    /// Return a stake token to `to` (the unstake path).
    fn transfer(&mut self, to: &AccountId, id: TokenId) -> Result<(), VaultError>;
}

/// One fair binary outcome per draw.
///
/// `true` keeps the accrued reward on unstake; `false` forfeits it to the
/// Weighted pool. Injected so deterministic tests can force either side.
pub trait CoinFlip: Send {
    fn flip(&mut self) -> bool;
}

/// Observability event consumer. No delivery guarantee; the engine never
/// rolls back because a sink misbehaved.
pub trait EventSink: Send {
    fn emit(&mut self, event: PoolEvent);
}

// ----------------------------------------------------------------------
// Production implementations
// ----------------------------------------------------------------------

/// Fair coin backed by a seedable RNG.
#[derive(Debug)]
pub struct RngCoinFlip {
    rng: StdRng,
}

impl RngCoinFlip {
    /// Deterministic coin for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Coin seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl CoinFlip for RngCoinFlip {
    fn flip(&mut self) -> bool {
        self.rng.r#gen::<bool>()
    }
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&mut self, _event: PoolEvent) {}
}

/// Sink that logs every event through `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&mut self, event: PoolEvent) {
        tracing::debug!(?event, "pool event");
    }
}

// ----------------------------------------------------------------------
// In-memory collaborators (tests and simulation)
// ----------------------------------------------------------------------

/// In-memory reward vault: a single pool balance plus a record of payouts
/// per receiving account.
#[derive(Debug, Clone, Default)]
pub struct MemoryVault {
    balance: u64,
    paid: HashMap<AccountId, u64>,
}

impl MemoryVault {
    /// Vault funded with `balance` drops.
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            paid: HashMap::new(),
        }
    }

    /// Add funding to the pool (the external deposit the engine never
    /// performs itself).
    pub fn fund(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Total paid out to `account` so far.
    pub fn paid_to(&self, account: &AccountId) -> u64 {
        *self.paid.get(account).unwrap_or(&0)
    }
}

impl RewardVault for MemoryVault {
    fn balance(&self) -> Result<u64, VaultError> {
        Ok(self.balance)
    }

    fn transfer(&mut self, to: &AccountId, amount: u64) -> Result<(), VaultError> {
        if amount > self.balance {
            return Err(VaultError::InsufficientBalance {
                have: self.balance,
                need: amount,
            });
        }
        self.balance -= amount;
        *self.paid.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

/// In-memory stake token ledger with per-token traits and owners.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenLedger {
    traits: HashMap<TokenId, TokenTraits>,
    owners: HashMap<TokenId, AccountId>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token with fixed traits owned by `owner`.
    pub fn register(&mut self, id: TokenId, traits: TokenTraits, owner: AccountId) {
        self.traits.insert(id, traits);
        self.owners.insert(id, owner);
    }

    /// Current owner, if the token exists.
    pub fn owner_of(&self, id: TokenId) -> Option<AccountId> {
        self.owners.get(&id).copied()
    }
}

impl StakeTokenLedger for MemoryTokenLedger {
    fn token_traits(&self, id: TokenId) -> Result<TokenTraits, VaultError> {
        self.traits
            .get(&id)
            .copied()
            .ok_or(VaultError::UnknownToken(id))
    }

    fn transfer(&mut self, to: &AccountId, id: TokenId) -> Result<(), VaultError> {
        if !self.owners.contains_key(&id) {
            return Err(VaultError::UnknownToken(id));
        }
        self.owners.insert(id, *to);
        Ok(())
    }
}

/// Scripted coin: pops queued outcomes, then repeats a default.
#[derive(Debug, Clone)]
pub struct FixedCoinFlip {
    queued: VecDeque<bool>,
    default: bool,
}

impl FixedCoinFlip {
    /// Coin that always lands on `outcome`.
    pub fn always(outcome: bool) -> Self {
        Self {
            queued: VecDeque::new(),
            default: outcome,
        }
    }

    /// Coin that plays `outcomes` in order, then repeats the last one.
    pub fn sequence(outcomes: &[bool]) -> Self {
        let default = outcomes.last().copied().unwrap_or(true);
        Self {
            queued: outcomes.iter().copied().collect(),
            default,
        }
    }
}

impl CoinFlip for FixedCoinFlip {
    fn flip(&mut self) -> bool {
        self.queued.pop_front().unwrap_or(self.default)
    }
}

/// Sink that stores every event for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    pub events: Vec<PoolEvent>,
}

impl EventSink for RecordingEventSink {
    fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }
}
