use super::transfer::TransferEngine;
use super::verification::VerificationWorker;
use super::worker_pool::WorkerPool;
use crate::config::LedgerConfig;
use crate::domain::account::{Account, AccountId, NewAccount};
use crate::domain::ports::{AccountStoreRef, OutcomeStoreRef};
use crate::domain::transfer::{
    FailureReason, TransferOrder, TransferReceipt, TransferRequest, TransferStatus,
};
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory::{InMemoryAccountStore, InMemoryOutcomeStore};
use crate::infrastructure::queue::WorkQueue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Entries currently waiting in each queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueDepths {
    pub verification: usize,
    pub transaction: usize,
}

/// Entry point for the request adapters.
///
/// Admission (`create_account`, `submit_transfer`) only writes to the store and
/// the queues; execution happens later in the worker pools started by [`start`].
///
/// [`start`]: LedgerService::start
#[derive(Clone)]
pub struct LedgerService {
    config: Arc<LedgerConfig>,
    store: AccountStoreRef,
    outcomes: OutcomeStoreRef,
    verification_queue: Arc<WorkQueue<Account>>,
    transaction_queue: Arc<WorkQueue<TransferRequest>>,
    verification_pool: Arc<WorkerPool<Account>>,
    transfer_pool: Arc<WorkerPool<TransferRequest>>,
}

impl LedgerService {
    /// Builds a service over in-memory stores.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let outcomes = Arc::new(InMemoryOutcomeStore::with_retention(config.outcome_retention));
        Self::with_stores(config, Arc::new(InMemoryAccountStore::new()), outcomes)
    }

    pub fn with_stores(
        config: LedgerConfig,
        store: AccountStoreRef,
        outcomes: OutcomeStoreRef,
    ) -> Result<Self> {
        config.validate()?;

        let verification_queue = Arc::new(WorkQueue::new(
            "verification",
            config.verification.queue_capacity,
            config.enqueue_policy,
        ));
        let transaction_queue = Arc::new(WorkQueue::new(
            "transaction",
            config.transfer.queue_capacity,
            config.enqueue_policy,
        ));

        let verification_pool = Arc::new(WorkerPool::new(
            verification_queue.clone(),
            Arc::new(VerificationWorker::new(store.clone())),
            &config.verification,
        ));
        let transfer_pool = Arc::new(WorkerPool::new(
            transaction_queue.clone(),
            Arc::new(TransferEngine::new(
                store.clone(),
                outcomes.clone(),
                transaction_queue.clone(),
                verification_queue.clone(),
                config.max_deferrals,
            )),
            &config.transfer,
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            outcomes,
            verification_queue,
            transaction_queue,
            verification_pool,
            transfer_pool,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Opens an account with the starting credit and queues it for verification.
    ///
    /// If the verification queue rejects the account it is still created; the
    /// transfer engine re-queues unverified senders when they first transfer.
    pub async fn create_account(&self, _initial: NewAccount) -> Result<Account> {
        let account = self.store.create(self.config.starting_balance).await?;
        info!(account = account.id, balance = %account.balance, "account opened");
        if let Err(e) = self.verification_queue.enqueue(account.clone()).await {
            warn!(account = account.id, error = %e, "account not queued for verification");
        }
        Ok(account)
    }

    pub async fn list_accounts(&self) -> Result<BTreeMap<AccountId, Account>> {
        self.store.all_accounts().await
    }

    /// Queues a transfer and returns a token for looking up its outcome.
    pub async fn submit_transfer(&self, order: TransferOrder) -> Result<TransferReceipt> {
        let request = TransferRequest::new(order);
        let token = request.token;
        self.outcomes.record(token, TransferStatus::Pending).await?;
        info!(
            %token,
            sender = request.sender_id,
            receiver = request.receiver_id,
            amount = %request.amount,
            "transfer submitted"
        );

        if let Err(e) = self.transaction_queue.enqueue(request).await {
            self.outcomes
                .record(
                    token,
                    TransferStatus::Failed {
                        reason: FailureReason::QueueFull,
                    },
                )
                .await?;
            return Err(e);
        }
        Ok(TransferReceipt::accepted(token))
    }

    pub async fn transfer_status(&self, token: Uuid) -> Result<TransferStatus> {
        self.outcomes
            .get(token)
            .await?
            .ok_or(LedgerError::TransferNotFound(token))
    }

    pub fn queue_depths(&self) -> QueueDepths {
        QueueDepths {
            verification: self.verification_queue.len(),
            transaction: self.transaction_queue.len(),
        }
    }

    /// Runs one verification tick and waits for its tasks.
    pub async fn run_verification_tick(&self) -> usize {
        self.verification_pool.tick().await
    }

    /// Runs one transfer tick and waits for its tasks.
    pub async fn run_transfer_tick(&self) -> usize {
        self.transfer_pool.tick().await
    }

    /// Starts both worker pools on their own schedules.
    pub fn start(&self) -> Workers {
        let (shutdown, signal) = watch::channel(false);
        let handles = vec![
            self.verification_pool.clone().spawn(signal.clone()),
            self.transfer_pool.clone().spawn(signal),
        ];
        Workers { shutdown, handles }
    }
}

/// Handle on the running worker pools.
pub struct Workers {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Stops scheduling new ticks and waits for in-flight tasks to finish.
    pub async fn shutdown(self) {
        // Receivers live inside the pool tasks; a send error means they already exited.
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker pool ended abnormally");
            }
        }
    }
}
