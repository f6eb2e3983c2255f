use crate::config::DEFAULT_OUTCOME_RETENTION;
use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::ports::{AccountStore, OutcomeStore, TransferApplied};
use crate::domain::transfer::TransferStatus;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A thread-safe in-memory store for accounts.
///
/// One store-wide `RwLock` guards the map. Every mutation holds the write lock
/// for its whole duration, so a verification write can never interleave with a
/// balance write, and readers only ever see fully applied transfers.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<BTreeMap<AccountId, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, starting_balance: Balance) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        // Accounts are never removed, so size + 1 is always a fresh id.
        let id = accounts.len() as AccountId + 1;
        let account = Account::new(id, starting_balance);
        accounts.insert(id, account.clone());
        debug!(account = id, "account created");
        Ok(account)
    }

    async fn get(&self, id: AccountId) -> Result<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn apply_verification(&self, id: AccountId) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        if account.verify() {
            debug!(account = id, "account verified");
        }
        Ok(account.clone())
    }

    async fn apply_transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount: Amount,
    ) -> Result<TransferApplied> {
        let mut accounts = self.accounts.write().await;
        let receiver = accounts
            .get(&receiver_id)
            .ok_or(LedgerError::AccountNotFound(receiver_id))?;
        let sender = accounts
            .get(&sender_id)
            .ok_or(LedgerError::AccountNotFound(sender_id))?;

        // Both balances are computed before either is written, so a failed
        // check leaves the store untouched.
        let sender_balance = sender.debited(amount)?;
        if sender_id != receiver_id {
            let receiver_balance = receiver.credited(amount)?;
            if let Some(sender) = accounts.get_mut(&sender_id) {
                sender.balance = sender_balance;
            }
            if let Some(receiver) = accounts.get_mut(&receiver_id) {
                receiver.balance = receiver_balance;
            }
        }

        let snapshot = |id: AccountId| {
            accounts
                .get(&id)
                .cloned()
                .ok_or(LedgerError::AccountNotFound(id))
        };
        Ok(TransferApplied {
            sender: snapshot(sender_id)?,
            receiver: snapshot(receiver_id)?,
        })
    }

    async fn all_accounts(&self) -> Result<BTreeMap<AccountId, Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.clone())
    }
}

/// A thread-safe in-memory record of transfer outcomes.
///
/// Pending and deferred transfers are always kept. Only the most recent
/// `retention` terminal outcomes are remembered; older ones are evicted in the
/// order they settled and their tokens are no longer found.
#[derive(Clone)]
pub struct InMemoryOutcomeStore {
    outcomes: Arc<RwLock<Outcomes>>,
}

struct Outcomes {
    statuses: HashMap<Uuid, TransferStatus>,
    settled: VecDeque<Uuid>,
    retention: usize,
}

impl InMemoryOutcomeStore {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_OUTCOME_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            outcomes: Arc::new(RwLock::new(Outcomes {
                statuses: HashMap::new(),
                settled: VecDeque::new(),
                retention,
            })),
        }
    }
}

impl Default for InMemoryOutcomeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomeStore for InMemoryOutcomeStore {
    async fn record(&self, token: Uuid, status: TransferStatus) -> Result<()> {
        let mut outcomes = self.outcomes.write().await;
        // A terminal outcome is final.
        if let Some(current) = outcomes.statuses.get(&token)
            && current.is_terminal()
        {
            return Ok(());
        }
        outcomes.statuses.insert(token, status);

        if status.is_terminal() {
            outcomes.settled.push_back(token);
            while outcomes.settled.len() > outcomes.retention {
                if let Some(evicted) = outcomes.settled.pop_front() {
                    outcomes.statuses.remove(&evicted);
                    debug!(token = %evicted, "outcome evicted");
                }
            }
        }
        Ok(())
    }

    async fn get(&self, token: Uuid) -> Result<Option<TransferStatus>> {
        let outcomes = self.outcomes.read().await;
        Ok(outcomes.statuses.get(&token).copied())
    }
}
