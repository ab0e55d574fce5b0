//! Shared test fixtures: canonical accounts, a round-number config, and
//! pool builders wired to the in-memory collaborators.

use nectar_core::config::PoolConfig;
use nectar_core::traits::{
    CoinFlip, FixedCoinFlip, MemoryTokenLedger, MemoryVault, RecordingEventSink,
};
use nectar_core::types::{AccountId, StakeClass, TokenId, TokenTraits};
use nectar_pool::Pool;

/// The stake-token contract account accepted by the deposit callback.
pub const SOURCE: AccountId = AccountId([0xE0; 20]);
/// The pool administrator.
pub const ADMIN: AccountId = AccountId([0xAD; 20]);

/// Deterministic account from a seed byte.
pub fn acct(seed: u8) -> AccountId {
    AccountId([seed; 20])
}

/// Config with round numbers: 1000 drops/day over 100 heights/day, 10
/// heights minimum duration, 20% tax.
pub fn test_config() -> PoolConfig {
    PoolConfig {
        daily_rate: 1_000,
        heights_per_day: 100,
        min_stake_duration: 10,
        tax_percent: 20,
        stake_token_source: SOURCE,
        admin: ADMIN,
    }
}

/// Pool over the in-memory collaborators with a scripted coin.
pub type TestPool<C> = Pool<MemoryVault, MemoryTokenLedger, C, RecordingEventSink>;

/// Build a pool with `funding` drops in the vault and the given coin.
pub fn pool_with<C: CoinFlip>(funding: u64, coin: C) -> TestPool<C> {
    Pool::new(
        test_config(),
        0,
        MemoryVault::new(funding),
        MemoryTokenLedger::new(),
        coin,
        RecordingEventSink::default(),
    )
    .unwrap()
}

/// Build a pool with a custom config.
pub fn pool_with_config<C: CoinFlip>(config: PoolConfig, funding: u64, coin: C) -> TestPool<C> {
    Pool::new(
        config,
        0,
        MemoryVault::new(funding),
        MemoryTokenLedger::new(),
        coin,
        RecordingEventSink::default(),
    )
    .unwrap()
}

/// Default pool: funded, always-keep coin.
pub fn funded_pool(funding: u64) -> TestPool<FixedCoinFlip> {
    pool_with(funding, FixedCoinFlip::always(true))
}

/// Mint a Linear token in the ledger and deposit it at `height`.
pub fn stake_linear<C: CoinFlip>(pool: &mut TestPool<C>, id: u64, owner: AccountId, height: u64) {
    let traits = TokenTraits {
        class: StakeClass::Linear,
        weight: 0,
    };
    ledger(pool).register(TokenId(id), traits, owner);
    pool.on_token_received(SOURCE, owner, TokenId(id), height)
        .unwrap();
}

/// Mint a Weighted token in the ledger and deposit it at `height`.
pub fn stake_weighted<C: CoinFlip>(
    pool: &mut TestPool<C>,
    id: u64,
    weight: u64,
    owner: AccountId,
    height: u64,
) {
    let traits = TokenTraits {
        class: StakeClass::Weighted,
        weight,
    };
    ledger(pool).register(TokenId(id), traits, owner);
    pool.on_token_received(SOURCE, owner, TokenId(id), height)
        .unwrap();
}

/// Mint a token without depositing it.
pub fn mint<C: CoinFlip>(
    pool: &mut TestPool<C>,
    id: u64,
    class: StakeClass,
    weight: u64,
    owner: AccountId,
) {
    ledger(pool).register(TokenId(id), TokenTraits { class, weight }, owner);
}

fn ledger<C: CoinFlip>(pool: &mut TestPool<C>) -> &mut MemoryTokenLedger {
    pool.token_ledger_mut()
}
