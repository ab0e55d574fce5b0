//! Share accumulator and tax redistribution.
//!
//! Weighted stakers earn through a global reward-per-weight accumulator:
//! a token's unsettled reward is `weight * (accumulator - snapshot)`.
//! The accumulator is fed exclusively by [`pay_tax`] (the taxes and
//! forfeitures of Linear claims) and never decreases.
//!
//! Rounding policy: when weight is staked, the floor division in
//! [`pay_tax`] permanently drops sub-unit remainders (dust). This is a
//! deliberate simplification carried over from the deployed state; do not
//! "fix" it. Tax received while no weight is staked is not lost: it is
//! carried in `pending_remainder` and folded into the next redistribution
//! that finds nonzero weight.

use nectar_core::error::StakeError;
use nectar_core::types::PoolState;

/// Unsettled reward of one Weighted token: `weight * (accumulator - snapshot)`.
///
/// `snapshot` must be an accumulator value previously observed, hence
/// never greater than the current accumulator.
pub fn earned(weight: u64, accumulator: u64, snapshot: u64) -> Result<u64, StakeError> {
    let delta = accumulator
        .checked_sub(snapshot)
        .ok_or(StakeError::ArithmeticOverflow)?;
    let gross = (weight as u128) * (delta as u128);
    u64::try_from(gross).map_err(|_| StakeError::ArithmeticOverflow)
}

/// Fold a taxed or forfeited amount into the Weighted pool.
///
/// With weight staked, the accumulator rises by
/// `(amount + pending_remainder) / total_weight_staked` (floor) and the
/// carry resets. With no weight staked the amount joins the carry; the
/// carry only folds in on the *next* call that finds weight, never
/// spontaneously.
pub fn pay_tax(state: &mut PoolState, amount: u64) -> Result<(), StakeError> {
    if state.total_weight_staked == 0 {
        state.pending_remainder = state
            .pending_remainder
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        return Ok(());
    }
    let distributable = state
        .pending_remainder
        .checked_add(amount)
        .ok_or(StakeError::ArithmeticOverflow)?;
    let increment = distributable / state.total_weight_staked;
    state.accumulator = state
        .accumulator
        .checked_add(increment)
        .ok_or(StakeError::ArithmeticOverflow)?;
    state.pending_remainder = 0;
    Ok(())
}
