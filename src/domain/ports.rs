use super::account::{Account, AccountId, Amount, Balance};
use super::transfer::TransferStatus;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Post-transfer snapshot of both sides of a successful transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferApplied {
    pub sender: Account,
    pub receiver: Account,
}

/// The single owner of account state.
///
/// Every operation is atomic with respect to every other: implementations must
/// serialize verification writes and balance writes touching the same account.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Assigns the next identifier and inserts an unverified account.
    async fn create(&self, starting_balance: Balance) -> Result<Account>;
    async fn get(&self, id: AccountId) -> Result<Option<Account>>;
    /// Idempotently marks the account verified.
    async fn apply_verification(&self, id: AccountId) -> Result<Account>;
    /// Checks funds, debits the sender and credits the receiver as one step.
    async fn apply_transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
    ) -> Result<TransferApplied>;
    async fn all_accounts(&self) -> Result<BTreeMap<AccountId, Account>>;
}

/// Per-request outcome keyed by the token handed back on submission.
#[async_trait]
pub trait OutcomeStore: Send + Sync {
    async fn record(&self, token: Uuid, status: TransferStatus) -> Result<()>;
    async fn get(&self, token: Uuid) -> Result<Option<TransferStatus>>;
}

/// Work performed on a single dequeued entry.
#[async_trait]
pub trait QueueHandler<T>: Send + Sync {
    async fn handle(&self, item: T);
}

pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type OutcomeStoreRef = Arc<dyn OutcomeStore>;
