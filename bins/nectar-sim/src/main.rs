//! Nectar pool simulator: drives random stake/claim/unstake traffic
//! against an in-memory pool and checks the accounting invariants after
//! every operation.
//!
//! Intended for soak-testing the engine outside the unit suite: a seeded
//! run is fully reproducible, so a reported failure can be replayed with
//! the same `--seed`.

use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use nectar_core::config::PoolConfig;
use nectar_core::constants::DROP;
use nectar_core::error::StakeError;
use nectar_core::traits::{
    MemoryTokenLedger, MemoryVault, RewardVault, RngCoinFlip, StakeTokenLedger, TracingEventSink,
};
use nectar_core::types::{AccountId, StakeClass, TokenId, TokenTraits};
use nectar_pool::Pool;

/// CLI arguments for the simulator.
#[derive(Debug, Parser)]
#[command(name = "nectar-sim")]
#[command(about = "Nectar staking pool traffic simulator", long_about = None)]
struct Args {
    /// Number of random operations to run.
    #[arg(long, default_value = "10000")]
    ops: u64,

    /// RNG seed for token traits, traffic, and coin flips.
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of stake tokens minted up front.
    #[arg(long, default_value = "64")]
    tokens: u64,

    /// Number of participant accounts.
    #[arg(long, default_value = "8")]
    accounts: u8,

    /// Initial vault funding, in whole reward coins.
    #[arg(long, default_value = "1000")]
    funding: u64,

    /// Heights advanced between operations (upper bound, drawn uniformly).
    #[arg(long, default_value = "100")]
    max_step: u64,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

type SimPool = Pool<MemoryVault, MemoryTokenLedger, RngCoinFlip, TracingEventSink>;

/// Aggregate counters for the run summary.
#[derive(Debug, Default)]
struct SimStats {
    stakes: u64,
    claims: u64,
    unstakes: u64,
    rejected: u64,
    total_paid: u64,
}

fn account(index: u8) -> AccountId {
    // Participant accounts occupy a low byte range; admin and source sit
    // well outside it.
    AccountId([index.wrapping_add(1); 20])
}

const SOURCE: AccountId = AccountId([0xE0; 20]);
const ADMIN: AccountId = AccountId([0xAD; 20]);

fn build_pool(args: &Args, rng: &mut StdRng) -> Result<SimPool> {
    let config = PoolConfig {
        stake_token_source: SOURCE,
        admin: ADMIN,
        ..PoolConfig::default()
    };

    let mut ledger = MemoryTokenLedger::new();
    for id in 0..args.tokens {
        let owner = account(rng.gen_range(0..args.accounts));
        // Roughly half the tokens in each class; weights span 1..=20.
        let traits = if rng.r#gen::<bool>() {
            TokenTraits {
                class: StakeClass::Linear,
                weight: 0,
            }
        } else {
            TokenTraits {
                class: StakeClass::Weighted,
                weight: rng.gen_range(1..=20),
            }
        };
        ledger.register(TokenId(id), traits, owner);
    }

    let funding = args
        .funding
        .checked_mul(DROP)
        .ok_or_else(|| anyhow!("funding overflows drop units"))?;
    Pool::new(
        config,
        0,
        MemoryVault::new(funding),
        ledger,
        RngCoinFlip::seeded(args.seed ^ 0x9E37_79B9_7F4A_7C15),
        TracingEventSink,
    )
    .context("pool construction failed")
}

/// Cross-check the pool aggregates against the live records. Any failure
/// here is an engine bug, not bad traffic.
fn check(pool: &SimPool, op: u64) -> Result<()> {
    let weights: Result<Vec<u64>> = pool
        .registry()
        .iter()
        .filter(|r| r.class == StakeClass::Weighted)
        .map(|r| {
            Ok(pool
                .token_ledger()
                .token_traits(r.token_id)
                .map_err(|e| anyhow!("{e}"))?
                .weight)
        })
        .collect();
    pool.state()
        .check_invariants(pool.registry().iter())
        .map_err(|msg| anyhow!("invariant broken after op {op}: {msg}"))?;
    pool.state()
        .check_weight_invariant(weights?)
        .map_err(|msg| anyhow!("invariant broken after op {op}: {msg}"))
}

fn run(args: &Args) -> Result<SimStats> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut pool = build_pool(args, &mut rng)?;
    let mut stats = SimStats::default();
    let mut height: u64 = 0;
    let mut staked: HashSet<TokenId> = HashSet::new();

    for op in 0..args.ops {
        height += rng.gen_range(0..=args.max_step);
        let token = TokenId(rng.gen_range(0..args.tokens));
        let owner = match pool.token_ledger().owner_of(token) {
            Some(owner) => owner,
            None => continue,
        };

        let result = match rng.gen_range(0..4u8) {
            0 | 1 => {
                if staked.contains(&token) {
                    stats.rejected += 1;
                    continue;
                }
                pool.on_token_received(SOURCE, owner, token, height)
                    .map(|()| {
                        staked.insert(token);
                        stats.stakes += 1;
                        0
                    })
            }
            2 => {
                if !staked.contains(&token) {
                    stats.rejected += 1;
                    continue;
                }
                pool.claim(owner, &[token], false, owner, height).map(|paid| {
                    stats.claims += 1;
                    paid
                })
            }
            _ => {
                if !staked.contains(&token) {
                    stats.rejected += 1;
                    continue;
                }
                pool.claim(owner, &[token], true, owner, height).map(|paid| {
                    staked.remove(&token);
                    stats.unstakes += 1;
                    paid
                })
            }
        };

        match result {
            Ok(paid) => {
                stats.total_paid += paid;
                debug!(op, height, %token, paid, "op applied");
            }
            // Expected rejections under random traffic; anything else is
            // a real failure.
            Err(
                StakeError::DurationNotMet { .. }
                | StakeError::BudgetExhausted
                | StakeError::AlreadyStaked(_),
            ) => {
                stats.rejected += 1;
            }
            Err(err) => {
                warn!(op, height, %token, %err, "unexpected rejection");
                return Err(anyhow!("op {op} failed: {err}"));
            }
        }

        check(&pool, op)?;
    }

    let remaining = pool.vault().balance().map_err(|e| anyhow!("{e}"))?;
    let state = pool.state();
    info!(
        height,
        linear = state.total_linear_staked,
        weighted = state.total_weighted_staked,
        weight = state.total_weight_staked,
        emitted = state.total_emitted,
        accumulator = state.accumulator,
        vault = remaining,
        "simulation complete"
    );
    Ok(stats)
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    info!(
        ops = args.ops,
        seed = args.seed,
        tokens = args.tokens,
        "starting simulation"
    );
    let stats = run(&args)?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "ops": args.ops,
                "seed": args.seed,
                "stakes": stats.stakes,
                "claims": stats.claims,
                "unstakes": stats.unstakes,
                "rejected": stats.rejected,
                "total_paid": stats.total_paid,
            })
        );
    } else {
        println!(
            "ops={} stakes={} claims={} unstakes={} rejected={} paid={}",
            args.ops, stats.stakes, stats.claims, stats.unstakes, stats.rejected, stats.total_paid
        );
    }
    Ok(())
}
