//! # nectar-pool
//! Dual-class staking-reward accrual engine.
//!
//! Accounts deposit non-fungible stake tokens of two classes and accrue a
//! fungible reward balance:
//! - **Linear**: rewards grow with heights elapsed since the stake
//!   snapshot, collectively capped by the pool's live reward balance
//!   (the funding ceiling). In-place claims are taxed; unstaking draws a
//!   fair coin and forfeits the whole accrual on the losing side.
//! - **Weighted**: rewards settle against a global reward-per-weight
//!   accumulator fed by the taxes and forfeitures of Linear stakers.
//!
//! All integer math is checked with u128 intermediates; sub-unit
//! remainders in tax redistribution are deliberately dropped (dust).
//! Every entry point runs to completion or aborts with no partial
//! effects; batch claims stage their mutations and commit atomically.

pub mod accumulator;
pub mod emission;
pub mod pool;
pub mod registry;

pub use pool::Pool;
pub use registry::StakeRegistry;
