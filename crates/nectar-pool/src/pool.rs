//! The pool engine: deposit handler, claim orchestrator, admin surface.
//!
//! One [`Pool`] owns the global [`PoolState`], the stake registry, and its
//! four collaborators. Every entry point takes the current ledger height
//! and the authenticated caller account from the host and either runs to
//! completion or aborts with no partial effects.
//!
//! Batch claims follow a staged-commit discipline: the loop works on a
//! copy of the pool state and an overlay of record changes, and nothing
//! touches the live state until every token in the batch has settled.
//! External calls (reward payout, stake-token returns) are issued strictly
//! after the commit: checks, then effects, then interactions.

use std::collections::HashMap;

use tracing::{debug, info};

use nectar_core::config::PoolConfig;
use nectar_core::constants::TAX_DENOMINATOR;
use nectar_core::error::StakeError;
use nectar_core::traits::{CoinFlip, EventSink, RewardVault, StakeTokenLedger};
use nectar_core::types::{
    AccountId, PoolEvent, PoolState, StakeClass, StakeRecord, TokenId,
};

use crate::accumulator;
use crate::emission;
use crate::registry::StakeRegistry;

/// Tax withheld from an in-place Linear claim: `amount * percent / 100`,
/// floored. Never exceeds `amount` for a valid config.
fn tax_of(amount: u64, tax_percent: u64) -> u64 {
    ((amount as u128) * (tax_percent as u128) / TAX_DENOMINATOR as u128) as u64
}

/// Record changes staged by one claim batch. `None` marks a deletion.
type StagedRecords = HashMap<TokenId, Option<StakeRecord>>;

/// The staking pool engine.
///
/// Generic over its collaborators so hosts plug in the real reward token,
/// stake-token ledger, randomness source, and event transport, while tests
/// use the in-memory implementations from `nectar-core`.
pub struct Pool<V, L, C, E> {
    config: PoolConfig,
    state: PoolState,
    registry: StakeRegistry,
    vault: V,
    tokens: L,
    coin: C,
    events: E,
}

impl<V, L, C, E> Pool<V, L, C, E>
where
    V: RewardVault,
    L: StakeTokenLedger,
    C: CoinFlip,
    E: EventSink,
{
    /// Create a pool anchored at `start_height`.
    ///
    /// # Errors
    ///
    /// [`StakeError::InvalidConfig`] when the config fails validation.
    pub fn new(
        config: PoolConfig,
        start_height: u64,
        vault: V,
        tokens: L,
        coin: C,
        events: E,
    ) -> Result<Self, StakeError> {
        config.validate()?;
        Ok(Self {
            state: PoolState::new(start_height),
            registry: StakeRegistry::new(),
            config,
            vault,
            tokens,
            coin,
            events,
        })
    }

    // ------------------------------------------------------------------
    // Deposit handler
    // ------------------------------------------------------------------

    /// Transfer-in callback: a stake token arrived at the pool.
    ///
    /// `caller` is the account the host authenticated as the source of the
    /// callback; only the configured stake-token contract may deposit.
    /// The token's class and weight are read from the metadata store
    /// before the record is initialized. A Linear deposit advances the
    /// emission tracker first so the new stake does not dilute rewards
    /// already owed for past heights.
    pub fn on_token_received(
        &mut self,
        caller: AccountId,
        owner: AccountId,
        token_id: TokenId,
        height: u64,
    ) -> Result<(), StakeError> {
        if caller != self.config.stake_token_source {
            return Err(StakeError::Unauthorized);
        }
        if self.state.paused {
            return Err(StakeError::Paused);
        }
        if self.registry.contains(token_id) {
            return Err(StakeError::AlreadyStaked(token_id));
        }
        let traits = self.tokens.token_traits(token_id)?;

        let mut draft = self.state;
        let snapshot = match traits.class {
            StakeClass::Weighted => {
                draft.total_weight_staked = draft
                    .total_weight_staked
                    .checked_add(traits.weight)
                    .ok_or(StakeError::ArithmeticOverflow)?;
                draft.total_weighted_staked += 1;
                draft.accumulator
            }
            StakeClass::Linear => {
                let ceiling = self.vault.balance()?;
                emission::advance(
                    &mut draft,
                    self.config.daily_rate,
                    self.config.heights_per_day,
                    height,
                    ceiling,
                )?;
                draft.total_linear_staked += 1;
                height
            }
        };

        self.state = draft;
        self.registry.insert(StakeRecord {
            token_id,
            owner,
            class: traits.class,
            snapshot,
        });
        debug!(%owner, %token_id, class = %traits.class, snapshot, "token staked");
        self.events.emit(PoolEvent::TokenStaked {
            owner,
            token_id,
            snapshot,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Claim orchestrator
    // ------------------------------------------------------------------

    /// Settle rewards for a batch of tokens, optionally unstaking them.
    ///
    /// For every token, the caller must be the record owner and `receiver`
    /// must equal that owner; payouts only ever go to the staking account
    /// itself. Tokens settle in order against the staged state, so a tax
    /// routed by an earlier Linear claim is already visible to a Weighted
    /// claim later in the same batch.
    ///
    /// The batch is all-or-nothing: any precondition failure, including an
    /// aggregate payout the live vault balance cannot cover, aborts the
    /// whole call with the live state untouched. On success the aggregate
    /// payout goes out as a single reward transfer, followed by one
    /// stake-token return per unstaked token.
    pub fn claim(
        &mut self,
        caller: AccountId,
        token_ids: &[TokenId],
        unstake: bool,
        receiver: AccountId,
        height: u64,
    ) -> Result<u64, StakeError> {
        if self.state.paused {
            return Err(StakeError::Paused);
        }

        let mut draft = self.state;
        let ceiling = self.vault.balance()?;
        emission::advance(
            &mut draft,
            self.config.daily_rate,
            self.config.heights_per_day,
            height,
            ceiling,
        )?;

        let mut staged: StagedRecords = HashMap::new();
        let mut returns: Vec<(TokenId, AccountId)> = Vec::new();
        let mut claim_events: Vec<PoolEvent> = Vec::new();
        let mut total_payout: u64 = 0;

        for &token_id in token_ids {
            // Reads go through the overlay so a duplicate id in one batch
            // observes the settlement of its earlier occurrence.
            let record = match staged.get(&token_id) {
                Some(Some(rec)) => *rec,
                Some(None) => return Err(StakeError::NotStaked(token_id)),
                None => *self
                    .registry
                    .get(token_id)
                    .ok_or(StakeError::NotStaked(token_id))?,
            };
            if caller != record.owner || receiver != record.owner {
                return Err(StakeError::Unauthorized);
            }
            let budget = self.vault.balance()?;
            if budget == 0 {
                return Err(StakeError::BudgetExhausted);
            }

            let payout = match record.class {
                StakeClass::Linear => self.settle_linear(
                    &mut draft,
                    &mut staged,
                    &mut returns,
                    record,
                    height,
                    unstake,
                    budget,
                )?,
                StakeClass::Weighted => self.settle_weighted(
                    &mut draft,
                    &mut staged,
                    &mut returns,
                    record,
                    unstake,
                )?,
            };
            total_payout = total_payout
                .checked_add(payout)
                .ok_or(StakeError::ArithmeticOverflow)?;
            claim_events.push(PoolEvent::Claim {
                token_id,
                payout,
                unstaked: unstake,
            });
        }

        // The aggregate payout must be coverable before anything commits.
        // A frozen-height amount derives from heights, not from
        // `total_emitted`, so it can exceed the live balance once the
        // ceiling has been consumed.
        if total_payout > self.vault.balance()? {
            return Err(StakeError::BudgetExhausted);
        }

        // Commit: the batch can no longer fail internally.
        self.state = draft;
        for (token_id, entry) in staged {
            match entry {
                Some(record) => self.registry.insert(record),
                None => {
                    self.registry.remove(token_id);
                }
            }
        }
        for event in claim_events {
            self.events.emit(event);
        }
        debug!(
            %caller,
            tokens = token_ids.len(),
            unstake,
            total_payout,
            "claim settled"
        );

        // Interactions last: one aggregate payout, then token returns. A
        // failed payout must not skip the returns; the records are already
        // deleted, so a skipped return would strand the token in the pool.
        let payout_result = if total_payout > 0 {
            self.vault.transfer(&receiver, total_payout)
        } else {
            Ok(())
        };
        for (token_id, owner) in returns {
            self.tokens.transfer(&owner, token_id)?;
        }
        payout_result?;
        Ok(total_payout)
    }

    /// Settle one Linear token against the draft state.
    #[allow(clippy::too_many_arguments)]
    fn settle_linear(
        &mut self,
        draft: &mut PoolState,
        staged: &mut StagedRecords,
        returns: &mut Vec<(TokenId, AccountId)>,
        record: StakeRecord,
        height: u64,
        unstake: bool,
        ceiling: u64,
    ) -> Result<u64, StakeError> {
        let staked_for = height
            .checked_sub(record.snapshot)
            .ok_or(StakeError::ArithmeticOverflow)?;
        // The duration gate only guards earn-in-place claims; an unstake
        // bypasses it entirely.
        if !unstake && staked_for < self.config.min_stake_duration {
            return Err(StakeError::DurationNotMet {
                staked_for,
                required: self.config.min_stake_duration,
            });
        }

        // With the budget exhausted, accrual is frozen at the height the
        // budget was last known sufficient. A stake taken after the freeze
        // has earned nothing.
        let accrued_heights = if draft.total_emitted < ceiling {
            staked_for
        } else {
            draft.last_emission_height.saturating_sub(record.snapshot)
        };
        let amount = emission::linear_accrual(
            accrued_heights,
            self.config.daily_rate,
            self.config.heights_per_day,
        )?;

        if unstake {
            let payout = if self.coin.flip() {
                amount
            } else {
                // Forfeit: the whole accrual goes to the Weighted pool.
                accumulator::pay_tax(draft, amount)?;
                0
            };
            draft.total_linear_staked = draft
                .total_linear_staked
                .checked_sub(1)
                .ok_or(StakeError::ArithmeticOverflow)?;
            staged.insert(record.token_id, None);
            returns.push((record.token_id, record.owner));
            Ok(payout)
        } else {
            let taxed = tax_of(amount, self.config.tax_percent);
            accumulator::pay_tax(draft, taxed)?;
            let mut updated = record;
            updated.snapshot = height;
            staged.insert(record.token_id, Some(updated));
            Ok(amount - taxed)
        }
    }

    /// Settle one Weighted token against the draft state.
    fn settle_weighted(
        &mut self,
        draft: &mut PoolState,
        staged: &mut StagedRecords,
        returns: &mut Vec<(TokenId, AccountId)>,
        record: StakeRecord,
        unstake: bool,
    ) -> Result<u64, StakeError> {
        let weight = self.tokens.token_traits(record.token_id)?.weight;
        let amount = accumulator::earned(weight, draft.accumulator, record.snapshot)?;

        if unstake {
            draft.total_weight_staked = draft
                .total_weight_staked
                .checked_sub(weight)
                .ok_or(StakeError::ArithmeticOverflow)?;
            draft.total_weighted_staked = draft
                .total_weighted_staked
                .checked_sub(1)
                .ok_or(StakeError::ArithmeticOverflow)?;
            staged.insert(record.token_id, None);
            returns.push((record.token_id, record.owner));
        } else {
            let mut updated = record;
            updated.snapshot = draft.accumulator;
            staged.insert(record.token_id, Some(updated));
        }
        Ok(amount)
    }

    /// Read-only preview of the gross pre-tax accrual for a batch.
    ///
    /// Mirrors the claim formulas without mutation, without the forfeiture
    /// draw, and without tax deduction. Linear tokens report 0 as soon as
    /// the funding budget is exhausted (the emission guard); Weighted
    /// accrual is never budget-gated since its funding already sits in the
    /// accumulator.
    pub fn available_claim_amount(
        &self,
        token_ids: &[TokenId],
        height: u64,
    ) -> Result<u64, StakeError> {
        let ceiling = self.vault.balance()?;
        let mut total: u64 = 0;
        for &token_id in token_ids {
            let record = self
                .registry
                .get(token_id)
                .ok_or(StakeError::NotStaked(token_id))?;
            let amount = match record.class {
                StakeClass::Linear => {
                    if self.state.total_emitted >= ceiling {
                        0
                    } else {
                        let staked_for = height
                            .checked_sub(record.snapshot)
                            .ok_or(StakeError::ArithmeticOverflow)?;
                        emission::linear_accrual(
                            staked_for,
                            self.config.daily_rate,
                            self.config.heights_per_day,
                        )?
                    }
                }
                StakeClass::Weighted => {
                    let weight = self.tokens.token_traits(token_id)?.weight;
                    accumulator::earned(weight, self.state.accumulator, record.snapshot)?
                }
            };
            total = total
                .checked_add(amount)
                .ok_or(StakeError::ArithmeticOverflow)?;
        }
        Ok(total)
    }

    // ------------------------------------------------------------------
    // Admin surface
    // ------------------------------------------------------------------

    /// Halt or resume deposits and claims. Admin only.
    pub fn set_paused(&mut self, caller: AccountId, paused: bool) -> Result<(), StakeError> {
        if caller != self.config.admin {
            return Err(StakeError::Unauthorized);
        }
        self.state.paused = paused;
        info!(paused, "pool pause flag set");
        self.events.emit(PoolEvent::PausedSet(paused));
        Ok(())
    }

    /// Replace the pool configuration. Admin only; the candidate is
    /// validated before it takes effect.
    pub fn update_config(
        &mut self,
        caller: AccountId,
        config: PoolConfig,
    ) -> Result<(), StakeError> {
        if caller != self.config.admin {
            return Err(StakeError::Unauthorized);
        }
        config.validate()?;
        self.config = config;
        info!("pool config updated");
        self.events.emit(PoolEvent::ConfigUpdated);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    /// Current pool aggregates.
    pub fn state(&self) -> &PoolState {
        &self.state
    }

    /// Current configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Live record for a token, if staked.
    pub fn record(&self, token_id: TokenId) -> Option<&StakeRecord> {
        self.registry.get(token_id)
    }

    /// The live stake registry.
    pub fn registry(&self) -> &StakeRegistry {
        &self.registry
    }

    /// Token ids currently staked by `owner`.
    pub fn staked_tokens_of(&self, owner: &AccountId) -> Vec<TokenId> {
        self.registry.tokens_of(owner)
    }

    /// The reward vault collaborator.
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Mutable access to the vault (e.g. external funding in tests and
    /// simulations).
    pub fn vault_mut(&mut self) -> &mut V {
        &mut self.vault
    }

    /// The stake-token ledger collaborator.
    pub fn token_ledger(&self) -> &L {
        &self.tokens
    }

    /// Mutable access to the stake-token ledger (e.g. minting fixtures in
    /// tests and simulations).
    pub fn token_ledger_mut(&mut self) -> &mut L {
        &mut self.tokens
    }

    /// The event sink collaborator.
    pub fn event_sink(&self) -> &E {
        &self.events
    }
}
