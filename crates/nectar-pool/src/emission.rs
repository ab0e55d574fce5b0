//! Linear emission tracking.
//!
//! Rewards for Linear stakers are emitted lazily: nothing advances in the
//! background, the tracker only moves when a claim or a Linear deposit
//! touches it. Total emission is capped by the funding ceiling (the live
//! reward balance held by the pool), and once the cap is reached both
//! `total_emitted` and `last_emission_height` freeze, so later claims
//! settle against the last height the budget was known sufficient.

use nectar_core::error::StakeError;
use nectar_core::types::PoolState;

/// Reward accrued by one Linear token over `heights` heights.
///
/// `heights * daily_rate / heights_per_day`, truncating toward zero.
pub fn linear_accrual(
    heights: u64,
    daily_rate: u64,
    heights_per_day: u64,
) -> Result<u64, StakeError> {
    debug_assert!(heights_per_day > 0);
    let gross = (heights as u128)
        .checked_mul(daily_rate as u128)
        .ok_or(StakeError::ArithmeticOverflow)?
        / heights_per_day as u128;
    u64::try_from(gross).map_err(|_| StakeError::ArithmeticOverflow)
}

/// Aggregate emission owed to all Linear stakers over `elapsed` heights.
///
/// `elapsed * staked * daily_rate / heights_per_day`, truncating.
pub fn emission_delta(
    elapsed: u64,
    staked: u64,
    daily_rate: u64,
    heights_per_day: u64,
) -> Result<u64, StakeError> {
    debug_assert!(heights_per_day > 0);
    let gross = (elapsed as u128)
        .checked_mul(staked as u128)
        .and_then(|v| v.checked_mul(daily_rate as u128))
        .ok_or(StakeError::ArithmeticOverflow)?
        / heights_per_day as u128;
    u64::try_from(gross).map_err(|_| StakeError::ArithmeticOverflow)
}

/// Lazily advance `total_emitted` to `height` against the live `ceiling`.
///
/// No-op once `total_emitted` has reached the ceiling: the tracker freezes
/// (including `last_emission_height`) rather than accruing against an
/// exhausted fund. The ceiling is the balance observed by the caller for
/// this call; it shrinks as payouts occur, so the cap is a moving target.
///
/// # Errors
///
/// [`StakeError::ArithmeticOverflow`] when `height` precedes
/// `last_emission_height` or the delta leaves the representable range.
pub fn advance(
    state: &mut PoolState,
    daily_rate: u64,
    heights_per_day: u64,
    height: u64,
    ceiling: u64,
) -> Result<(), StakeError> {
    let elapsed = height
        .checked_sub(state.last_emission_height)
        .ok_or(StakeError::ArithmeticOverflow)?;
    if state.total_emitted >= ceiling {
        return Ok(());
    }
    let delta = emission_delta(elapsed, state.total_linear_staked, daily_rate, heights_per_day)?;
    state.total_emitted = state
        .total_emitted
        .checked_add(delta)
        .ok_or(StakeError::ArithmeticOverflow)?
        .min(ceiling);
    state.last_emission_height = height;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(staked: u64, emitted: u64, last: u64) -> PoolState {
        let mut state = PoolState::new(last);
        state.total_linear_staked = staked;
        state.total_emitted = emitted;
        state
    }

    // ------------------------------------------------------------------
    // linear_accrual
    // ------------------------------------------------------------------

    #[test]
    fn accrual_truncates() {
        // 50 heights at 1000/day over 100 heights/day = 500.
        assert_eq!(linear_accrual(50, 1_000, 100).unwrap(), 500);
        // 3 heights at 10/day over 7 heights/day = 30/7 = 4.
        assert_eq!(linear_accrual(3, 10, 7).unwrap(), 4);
    }

    #[test]
    fn accrual_zero_heights() {
        assert_eq!(linear_accrual(0, 1_000, 100).unwrap(), 0);
    }

    #[test]
    fn accrual_overflow_detected() {
        let err = linear_accrual(u64::MAX, u64::MAX, 1).unwrap_err();
        assert_eq!(err, StakeError::ArithmeticOverflow);
    }

    // ------------------------------------------------------------------
    // emission_delta
    // ------------------------------------------------------------------

    #[test]
    fn delta_scales_with_staked_count() {
        assert_eq!(emission_delta(50, 1, 1_000, 100).unwrap(), 500);
        assert_eq!(emission_delta(50, 3, 1_000, 100).unwrap(), 1_500);
    }

    #[test]
    fn delta_zero_when_nothing_staked() {
        assert_eq!(emission_delta(50, 0, 1_000, 100).unwrap(), 0);
    }

    #[test]
    fn delta_u128_intermediates_survive_large_inputs() {
        // Would overflow u64 as a product, fine in u128.
        let delta = emission_delta(1 << 40, 1 << 20, 1 << 10, 1 << 30).unwrap();
        assert_eq!(delta, 1 << 40);
    }

    // ------------------------------------------------------------------
    // advance
    // ------------------------------------------------------------------

    #[test]
    fn advance_accrues_and_moves_height() {
        let mut state = state_with(2, 0, 100);
        advance(&mut state, 1_000, 100, 150, u64::MAX).unwrap();
        // 50 heights * 2 staked * 1000 / 100 = 1000.
        assert_eq!(state.total_emitted, 1_000);
        assert_eq!(state.last_emission_height, 150);
    }

    #[test]
    fn advance_clamps_to_ceiling() {
        let mut state = state_with(2, 0, 100);
        advance(&mut state, 1_000, 100, 150, 700).unwrap();
        assert_eq!(state.total_emitted, 700);
        assert_eq!(state.last_emission_height, 150);
    }

    #[test]
    fn advance_freezes_when_exhausted() {
        let mut state = state_with(2, 700, 100);
        advance(&mut state, 1_000, 100, 150, 700).unwrap();
        // Neither field moves once the ceiling is reached.
        assert_eq!(state.total_emitted, 700);
        assert_eq!(state.last_emission_height, 100);
    }

    #[test]
    fn advance_resumes_if_ceiling_rises() {
        // New funding raises the live ceiling; emission resumes from the
        // frozen height.
        let mut state = state_with(1, 700, 100);
        advance(&mut state, 1_000, 100, 150, 700).unwrap();
        assert_eq!(state.last_emission_height, 100);
        advance(&mut state, 1_000, 100, 150, 10_000).unwrap();
        assert_eq!(state.total_emitted, 1_200);
        assert_eq!(state.last_emission_height, 150);
    }

    #[test]
    fn advance_same_height_is_noop() {
        let mut state = state_with(5, 42, 100);
        advance(&mut state, 1_000, 100, 100, u64::MAX).unwrap();
        assert_eq!(state.total_emitted, 42);
        assert_eq!(state.last_emission_height, 100);
    }

    #[test]
    fn advance_rejects_height_regression() {
        let mut state = state_with(1, 0, 100);
        let err = advance(&mut state, 1_000, 100, 99, u64::MAX).unwrap_err();
        assert_eq!(err, StakeError::ArithmeticOverflow);
    }

    #[test]
    fn total_emitted_is_monotone() {
        let mut state = state_with(3, 0, 0);
        let mut prev = 0;
        for height in [10, 25, 25, 90, 200] {
            advance(&mut state, 500, 10, height, 1_000_000).unwrap();
            assert!(state.total_emitted >= prev);
            prev = state.total_emitted;
        }
    }

    // --- proptest ---

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn accrual_monotone_in_heights(
            a in 0u64..1_000_000_000,
            b in 0u64..1_000_000_000,
            rate in 1u64..1_000_000,
            hpd in 1u64..100_000,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                linear_accrual(lo, rate, hpd).unwrap() <= linear_accrual(hi, rate, hpd).unwrap()
            );
        }

        #[test]
        fn delta_covers_per_token_accruals(
            elapsed in 0u64..1_000_000,
            staked in 0u64..10_000,
            rate in 1u64..1_000_000,
            hpd in 1u64..100_000,
        ) {
            // The aggregate delta truncates once; the per-token sum
            // truncates per token, so it never exceeds the aggregate.
            let per_token = linear_accrual(elapsed, rate, hpd).unwrap();
            let delta = emission_delta(elapsed, staked, rate, hpd).unwrap();
            prop_assert!(per_token as u128 * staked as u128 <= delta as u128);
        }

        #[test]
        fn advance_never_exceeds_ceiling(
            staked in 0u64..10_000,
            height in 0u64..1_000_000,
            ceiling in 0u64..1_000_000_000_000,
            rate in 1u64..1_000_000,
            hpd in 1u64..100_000,
        ) {
            let mut state = state_with(staked, 0, 0);
            advance(&mut state, rate, hpd, height, ceiling).unwrap();
            prop_assert!(state.total_emitted <= ceiling);
        }
    }
}
