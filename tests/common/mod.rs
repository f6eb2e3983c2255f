#![allow(dead_code)]

use p2p_ledger::application::service::LedgerService;
use p2p_ledger::config::{LedgerConfig, PoolConfig};
use p2p_ledger::domain::account::{AccountId, Amount, Balance};
use p2p_ledger::domain::transfer::TransferOrder;
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;

/// Config whose pools tick fast enough for tests that use the real scheduler.
pub fn fast_config(fan_out: usize) -> LedgerConfig {
    let pool = PoolConfig {
        fan_out,
        tick_interval: Duration::from_millis(10),
        queue_capacity: 1000,
    };
    LedgerConfig {
        verification: pool,
        transfer: pool,
        ..LedgerConfig::default()
    }
}

pub fn order(sender_id: AccountId, receiver_id: AccountId, amount: Decimal) -> TransferOrder {
    TransferOrder {
        sender_id,
        receiver_id,
        amount: Amount::new(amount).unwrap(),
    }
}

pub async fn balance(service: &LedgerService, id: AccountId) -> Balance {
    service.list_accounts().await.unwrap()[&id].balance
}

/// Creates `count` accounts and drains the verification queue completely.
pub async fn verified_accounts(service: &LedgerService, count: usize) {
    for _ in 0..count {
        service.create_account(Default::default()).await.unwrap();
    }
    while service.run_verification_tick().await > 0 {}
}

/// Polls `check` until it returns true or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
