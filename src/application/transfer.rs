use crate::domain::account::Account;
use crate::domain::ports::{AccountStoreRef, OutcomeStoreRef, QueueHandler};
use crate::domain::transfer::{FailureReason, TransferRequest, TransferStatus};
use crate::error::LedgerError;
use crate::infrastructure::queue::WorkQueue;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Executes dequeued transfer requests against the account store.
///
/// A request whose sender is not yet verified is put back on the transaction
/// queue and the sender is put (again) on the verification queue, so the
/// transfer is retried on a later tick. Retries are bounded by `max_deferrals`.
/// Worker-side re-queuing never blocks: a full queue fails the request.
pub struct TransferEngine {
    store: AccountStoreRef,
    outcomes: OutcomeStoreRef,
    transactions: Arc<WorkQueue<TransferRequest>>,
    verifications: Arc<WorkQueue<Account>>,
    max_deferrals: u32,
}

impl TransferEngine {
    pub fn new(
        store: AccountStoreRef,
        outcomes: OutcomeStoreRef,
        transactions: Arc<WorkQueue<TransferRequest>>,
        verifications: Arc<WorkQueue<Account>>,
        max_deferrals: u32,
    ) -> Self {
        Self {
            store,
            outcomes,
            transactions,
            verifications,
            max_deferrals,
        }
    }

    /// Runs one request through the gating state machine and records the outcome.
    pub async fn execute(&self, request: TransferRequest) -> TransferStatus {
        let token = request.token;
        let status = self.evaluate(request).await;
        if let Err(e) = self.outcomes.record(token, status).await {
            error!(%token, error = %e, "failed to record transfer outcome");
        }
        status
    }

    async fn evaluate(&self, request: TransferRequest) -> TransferStatus {
        let sender = match self.store.get(request.sender_id).await {
            Ok(Some(sender)) => sender,
            Ok(None) => {
                warn!(token = %request.token, sender = request.sender_id, "sender not found");
                return failed(FailureReason::SenderNotFound);
            }
            Err(e) => {
                error!(token = %request.token, error = %e, "sender lookup failed");
                return failed(FailureReason::StoreUnavailable);
            }
        };

        if !sender.verified {
            return self.defer(request, sender);
        }

        match self
            .store
            .apply_transfer(request.sender_id, request.receiver_id, request.amount)
            .await
        {
            Ok(applied) => {
                info!(
                    token = %request.token,
                    sender = applied.sender.id,
                    receiver = applied.receiver.id,
                    amount = %request.amount,
                    "transfer completed"
                );
                TransferStatus::Completed
            }
            Err(LedgerError::InsufficientFunds {
                balance, requested, ..
            }) => {
                warn!(
                    token = %request.token,
                    sender = request.sender_id,
                    %balance,
                    %requested,
                    "transfer dropped: insufficient funds"
                );
                failed(FailureReason::InsufficientFunds)
            }
            Err(LedgerError::AccountNotFound(id)) if id == request.sender_id => {
                failed(FailureReason::SenderNotFound)
            }
            Err(LedgerError::AccountNotFound(id)) => {
                warn!(token = %request.token, receiver = id, "transfer dropped: receiver not found");
                failed(FailureReason::ReceiverNotFound)
            }
            Err(LedgerError::BalanceOverflow(id)) => {
                warn!(token = %request.token, account = id, "transfer dropped: balance out of range");
                failed(FailureReason::BalanceOverflow)
            }
            Err(e) => {
                error!(token = %request.token, error = %e, "transfer failed in store");
                failed(FailureReason::StoreUnavailable)
            }
        }
    }

    fn defer(&self, request: TransferRequest, sender: Account) -> TransferStatus {
        if request.attempts >= self.max_deferrals {
            warn!(
                token = %request.token,
                sender = sender.id,
                attempts = request.attempts,
                "transfer dropped: sender never verified"
            );
            return failed(FailureReason::RetriesExhausted);
        }

        let sender_id = sender.id;
        if let Err(e) = self.verifications.try_enqueue(sender) {
            warn!(sender = sender_id, error = %e, "could not re-queue sender for verification");
        }

        let retry = request.deferred();
        let attempts = retry.attempts;
        match self.transactions.try_enqueue(retry) {
            Ok(()) => {
                debug!(token = %request.token, sender = sender_id, attempts, "transfer deferred");
                TransferStatus::Deferred { attempts }
            }
            Err(e) => {
                warn!(token = %request.token, error = %e, "transfer dropped: could not re-queue");
                failed(FailureReason::QueueFull)
            }
        }
    }
}

fn failed(reason: FailureReason) -> TransferStatus {
    TransferStatus::Failed { reason }
}

#[async_trait]
impl QueueHandler<TransferRequest> for TransferEngine {
    async fn handle(&self, request: TransferRequest) {
        self.execute(request).await;
    }
}
