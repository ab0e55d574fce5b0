//! Pool configuration.
//!
//! Supplied at deployment and replaceable only through the administrator
//! entry point; the engine validates every candidate with
//! [`PoolConfig::validate`] before accepting it.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DAILY_RATE, DEFAULT_HEIGHTS_PER_DAY, DEFAULT_MIN_STAKE_DURATION, DEFAULT_TAX_PERCENT,
    TAX_DENOMINATOR,
};
use crate::error::StakeError;
use crate::types::AccountId;

/// Economic and administrative parameters of one pool.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Reward emitted per day to all Linear stakers combined, in drops.
    pub daily_rate: u64,
    /// Ledger heights per day; the divisor for all per-day accrual math.
    pub heights_per_day: u64,
    /// Minimum heights a Linear token must be staked before an in-place
    /// claim. Unstaking is never gated by this.
    pub min_stake_duration: u64,
    /// Tax withheld from in-place Linear claims, in percent (0–100).
    /// Taxed amounts are redistributed to Weighted stakers.
    pub tax_percent: u64,
    /// The stake token contract. Deposits are accepted only when the
    /// transfer callback originates from this account.
    pub stake_token_source: AccountId,
    /// Administrator allowed to pause the pool and replace this config.
    pub admin: AccountId,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            daily_rate: DEFAULT_DAILY_RATE,
            heights_per_day: DEFAULT_HEIGHTS_PER_DAY,
            min_stake_duration: DEFAULT_MIN_STAKE_DURATION,
            tax_percent: DEFAULT_TAX_PERCENT,
            stake_token_source: AccountId::ZERO,
            admin: AccountId::ZERO,
        }
    }
}

impl PoolConfig {
    /// Validate administrative parameters.
    ///
    /// # Errors
    ///
    /// [`StakeError::InvalidConfig`] when `heights_per_day` is zero (the
    /// accrual divisor), `daily_rate` is zero, or `tax_percent` exceeds
    /// 100.
    pub fn validate(&self) -> Result<(), StakeError> {
        if self.heights_per_day == 0 {
            return Err(StakeError::InvalidConfig(
                "heights_per_day must be nonzero".into(),
            ));
        }
        if self.daily_rate == 0 {
            return Err(StakeError::InvalidConfig("daily_rate must be nonzero".into()));
        }
        if self.tax_percent > TAX_DENOMINATOR {
            return Err(StakeError::InvalidConfig(format!(
                "tax_percent {} exceeds {}",
                self.tax_percent, TAX_DENOMINATOR
            )));
        }
        Ok(())
    }
}
