use crate::domain::account::Account;
use crate::domain::ports::{AccountStoreRef, QueueHandler};
use async_trait::async_trait;
use tracing::{info, warn};

/// Marks dequeued accounts as verified.
///
/// The queued `Account` is only a snapshot taken at enqueue time; the worker
/// goes back to the store by id and lets it apply the change under its lock.
pub struct VerificationWorker {
    store: AccountStoreRef,
}

impl VerificationWorker {
    pub fn new(store: AccountStoreRef) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueueHandler<Account> for VerificationWorker {
    async fn handle(&self, account: Account) {
        match self.store.apply_verification(account.id).await {
            Ok(verified) => info!(account = verified.id, "account verified"),
            Err(e) => warn!(account = account.id, error = %e, "verification failed"),
        }
    }
}
