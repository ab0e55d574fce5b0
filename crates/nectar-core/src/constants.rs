//! Engine constants. All reward amounts are in drops (1 NCT = 10^8 drops).

/// Smallest reward unit: 1 NCT = 10^8 drops.
pub const DROP: u64 = 100_000_000;

/// Denominator for the claim tax: `tax_percent` is expressed out of 100.
pub const TAX_DENOMINATOR: u64 = 100;

/// Default reward emitted per day to all Linear stakers combined, in drops.
pub const DEFAULT_DAILY_RATE: u64 = 10 * DROP;

/// Default ledger heights per day (15-second blocks).
pub const DEFAULT_HEIGHTS_PER_DAY: u64 = 5_760;

/// Default minimum staking duration before an in-place Linear claim, in heights.
///
/// One day with the default block cadence. Unstaking is never gated by this.
pub const DEFAULT_MIN_STAKE_DURATION: u64 = 5_760;

/// Default tax on in-place Linear claims, in percent (see [`TAX_DENOMINATOR`]).
pub const DEFAULT_TAX_PERCENT: u64 = 20;
