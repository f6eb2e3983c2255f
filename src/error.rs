use crate::domain::account::{AccountId, Balance};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Balance,
        requested: Balance,
    },
    #[error("Balance of account {0} would leave the supported range")]
    BalanceOverflow(AccountId),
    #[error("{0} queue is full")]
    QueueFull(&'static str),
    #[error("{0} queue is closed")]
    QueueClosed(&'static str),
    #[error("Transfer {0} not found")]
    TransferNotFound(Uuid),
    #[error("Configuration error: {0}")]
    Config(String),
    /// Raised by store backends when they cannot serve a request.
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
