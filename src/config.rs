use crate::domain::account::{Balance, MAX_SCALE, balance_ceiling};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settled transfer outcomes kept for status lookups.
pub const DEFAULT_OUTCOME_RETENTION: usize = 10_000;

/// What a producer does when it finds a queue at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnqueuePolicy {
    /// Wait until a drain frees a slot.
    #[default]
    Block,
    /// Fail immediately with `QueueFull`.
    Reject,
}

/// Scheduling parameters of one worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of tasks spawned per tick.
    pub fan_out: usize,
    pub tick_interval: Duration,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fan_out: 2,
            tick_interval: Duration::from_secs(10),
            queue_capacity: 1000,
        }
    }
}

/// Settings consumed by the ledger core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub verification: PoolConfig,
    pub transfer: PoolConfig,
    /// Credit granted to every new account.
    pub starting_balance: Balance,
    /// How many times a transfer may be deferred on an unverified sender
    /// before it fails with `RetriesExhausted`.
    pub max_deferrals: u32,
    pub enqueue_policy: EnqueuePolicy,
    /// How many completed or failed outcomes stay queryable by token.
    pub outcome_retention: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verification: PoolConfig::default(),
            transfer: PoolConfig::default(),
            starting_balance: Balance::new(Decimal::from(1000)),
            max_deferrals: 100,
            enqueue_policy: EnqueuePolicy::Block,
            outcome_retention: DEFAULT_OUTCOME_RETENTION,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, pool) in [("verification", &self.verification), ("transfer", &self.transfer)] {
            if pool.fan_out == 0 {
                return Err(LedgerError::Config(format!(
                    "{name} workers must be at least 1"
                )));
            }
            if pool.queue_capacity == 0 {
                return Err(LedgerError::Config(format!(
                    "{name} queue capacity must be at least 1"
                )));
            }
            if pool.tick_interval.is_zero() {
                return Err(LedgerError::Config(format!(
                    "{name} tick interval must be non-zero"
                )));
            }
        }
        if self.starting_balance.is_negative() {
            return Err(LedgerError::Config(
                "starting balance must not be negative".to_string(),
            ));
        }
        if self.starting_balance.0 > balance_ceiling() {
            return Err(LedgerError::Config(format!(
                "starting balance must not exceed {}",
                balance_ceiling()
            )));
        }
        if self.starting_balance.0.normalize().scale() > MAX_SCALE {
            return Err(LedgerError::Config(format!(
                "starting balance supports at most {MAX_SCALE} decimal places"
            )));
        }
        if self.outcome_retention == 0 {
            return Err(LedgerError::Config(
                "outcome retention must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
