//! Collaborator contract tests: the engine's outbound calls are observed
//! through mock implementations of the vault and token ledger.

use mockall::mock;
use mockall::predicate::eq;

use nectar_core::error::{StakeError, VaultError};
use nectar_core::traits::{FixedCoinFlip, NullEventSink, RewardVault, StakeTokenLedger};
use nectar_core::types::{AccountId, StakeClass, TokenId, TokenTraits};
use nectar_pool::Pool;
use nectar_tests::helpers::{SOURCE, acct, test_config};

mock! {
    pub Vault {}
    impl RewardVault for Vault {
        fn balance(&self) -> Result<u64, VaultError>;
        fn transfer(&mut self, to: &AccountId, amount: u64) -> Result<(), VaultError>;
    }
}

mock! {
    pub Ledger {}
    impl StakeTokenLedger for Ledger {
        fn token_traits(&self, id: TokenId) -> Result<TokenTraits, VaultError>;
        fn transfer(&mut self, to: &AccountId, id: TokenId) -> Result<(), VaultError>;
    }
}

const LINEAR: TokenTraits = TokenTraits {
    class: StakeClass::Linear,
    weight: 0,
};

fn mock_pool(
    vault: MockVault,
    ledger: MockLedger,
) -> Pool<MockVault, MockLedger, FixedCoinFlip, NullEventSink> {
    Pool::new(
        test_config(),
        0,
        vault,
        ledger,
        FixedCoinFlip::always(true),
        NullEventSink,
    )
    .unwrap()
}

#[test]
fn claim_issues_exactly_one_aggregate_transfer() {
    let alice = acct(1);

    let mut vault = MockVault::new();
    vault.expect_balance().returning(|| Ok(1_000_000));
    // Two tokens, 400 net each, one transfer for the total.
    vault
        .expect_transfer()
        .with(eq(alice), eq(800u64))
        .times(1)
        .returning(|_, _| Ok(()));

    let mut ledger = MockLedger::new();
    ledger.expect_token_traits().returning(|_| Ok(LINEAR));
    ledger.expect_transfer().times(0);

    let mut pool = mock_pool(vault, ledger);
    pool.on_token_received(SOURCE, alice, TokenId(1), 0).unwrap();
    pool.on_token_received(SOURCE, alice, TokenId(2), 0).unwrap();

    let payout = pool
        .claim(alice, &[TokenId(1), TokenId(2)], false, alice, 50)
        .unwrap();
    assert_eq!(payout, 800);
}

#[test]
fn failed_batch_makes_no_external_transfers() {
    let alice = acct(1);

    let mut vault = MockVault::new();
    vault.expect_balance().returning(|| Ok(1_000_000));
    vault.expect_transfer().times(0);

    let mut ledger = MockLedger::new();
    ledger.expect_token_traits().returning(|_| Ok(LINEAR));
    ledger.expect_transfer().times(0);

    let mut pool = mock_pool(vault, ledger);
    pool.on_token_received(SOURCE, alice, TokenId(1), 0).unwrap();

    // Unknown second token aborts the batch before any interaction.
    pool.claim(alice, &[TokenId(1), TokenId(9)], true, alice, 50)
        .unwrap_err();
}

#[test]
fn unstake_returns_each_token_to_its_owner() {
    let alice = acct(1);

    let mut vault = MockVault::new();
    vault.expect_balance().returning(|| Ok(1_000_000));
    vault
        .expect_transfer()
        .times(1)
        .returning(|_, _| Ok(()));

    let mut ledger = MockLedger::new();
    ledger.expect_token_traits().returning(|_| Ok(LINEAR));
    ledger
        .expect_transfer()
        .with(eq(alice), eq(TokenId(1)))
        .times(1)
        .returning(|_, _| Ok(()));
    ledger
        .expect_transfer()
        .with(eq(alice), eq(TokenId(2)))
        .times(1)
        .returning(|_, _| Ok(()));

    let mut pool = mock_pool(vault, ledger);
    pool.on_token_received(SOURCE, alice, TokenId(1), 0).unwrap();
    pool.on_token_received(SOURCE, alice, TokenId(2), 0).unwrap();

    pool.claim(alice, &[TokenId(1), TokenId(2)], true, alice, 50)
        .unwrap();
}

#[test]
fn token_returns_survive_failed_payout() {
    let alice = acct(1);

    // The vault reports ample balance but its transfer endpoint is down.
    let mut vault = MockVault::new();
    vault.expect_balance().returning(|| Ok(1_000_000));
    vault
        .expect_transfer()
        .times(1)
        .returning(|_, _| Err(VaultError::TransferFailed("vault offline".into())));

    // The stake token must still come back: its record is gone after the
    // commit, so a skipped return would strand it.
    let mut ledger = MockLedger::new();
    ledger.expect_token_traits().returning(|_| Ok(LINEAR));
    ledger
        .expect_transfer()
        .with(eq(alice), eq(TokenId(1)))
        .times(1)
        .returning(|_, _| Ok(()));

    let mut pool = mock_pool(vault, ledger);
    pool.on_token_received(SOURCE, alice, TokenId(1), 0).unwrap();

    let err = pool.claim(alice, &[TokenId(1)], true, alice, 50).unwrap_err();
    assert!(matches!(err, StakeError::Collaborator(_)));
}

#[test]
fn deposit_reads_traits_but_never_transfers() {
    let alice = acct(1);

    let mut vault = MockVault::new();
    vault.expect_balance().returning(|| Ok(1_000_000));
    vault.expect_transfer().times(0);

    let mut ledger = MockLedger::new();
    ledger
        .expect_token_traits()
        .with(eq(TokenId(1)))
        .times(1)
        .returning(|_| Ok(LINEAR));
    ledger.expect_transfer().times(0);

    let mut pool = mock_pool(vault, ledger);
    pool.on_token_received(SOURCE, alice, TokenId(1), 0).unwrap();
}

#[test]
fn zero_payout_claim_issues_no_reward_transfer() {
    let alice = acct(1);

    let mut vault = MockVault::new();
    vault.expect_balance().returning(|| Ok(1_000_000));
    vault.expect_transfer().times(0);

    let mut ledger = MockLedger::new();
    ledger.expect_token_traits().returning(|_| {
        Ok(TokenTraits {
            class: StakeClass::Weighted,
            weight: 10,
        })
    });
    ledger.expect_transfer().times(0);

    let mut pool = mock_pool(vault, ledger);
    pool.on_token_received(SOURCE, alice, TokenId(1), 0).unwrap();

    // Nothing in the accumulator yet: settlement is 0 and the vault is
    // never touched.
    let payout = pool.claim(alice, &[TokenId(1)], false, alice, 50).unwrap();
    assert_eq!(payout, 0);
}
