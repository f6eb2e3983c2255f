use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the account store at creation time.
pub type AccountId = u64;

/// Decimal places carried by amounts and balances.
pub const MAX_SCALE: u32 = 4;

/// Largest balance an account may hold.
///
/// With at most [`MAX_SCALE`] decimal places this stays far inside the range
/// `Decimal` represents exactly, so debits and credits never round.
pub fn balance_ceiling() -> Decimal {
    Decimal::from(1_000_000_000_000_000_000u64)
}

/// A signed monetary value.
///
/// Thin wrapper around `rust_decimal::Decimal` so balances cannot be mixed up
/// with raw numbers or with transfer amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// `None` if the result would pass [`balance_ceiling`].
    pub fn checked_add(self, amount: Amount) -> Option<Self> {
        self.0
            .checked_add(amount.0)
            .filter(|sum| *sum <= balance_ceiling())
            .map(Self)
    }

    pub fn checked_sub(self, amount: Amount) -> Option<Self> {
        self.0.checked_sub(amount.0).map(Self)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A strictly positive amount requested to move between two accounts.
///
/// Deserialization goes through [`Amount::new`], so a zero or negative amount,
/// or one with more than [`MAX_SCALE`] decimal places, is rejected while the
/// request body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::MalformedInput(format!(
                "amount must be positive, got {value}"
            )));
        }
        let value = value.normalize();
        if value.scale() > MAX_SCALE {
            return Err(LedgerError::MalformedInput(format!(
                "amount supports at most {MAX_SCALE} decimal places, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Values accepted when an account is opened.
///
/// The store assigns the id, the starting balance and the verification flag,
/// so any field the caller sends is ignored; the body only has to be a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewAccount {}

/// A ledger entry: identity, balance and verification status.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub id: AccountId,
    pub balance: Balance,
    /// Set once by the verification workflow; an unverified account cannot send funds.
    pub verified: bool,
}

impl Account {
    pub fn new(id: AccountId, starting_balance: Balance) -> Self {
        Self {
            id,
            balance: starting_balance,
            verified: false,
        }
    }

    /// Marks the account verified. Returns `true` if this call made the transition.
    pub fn verify(&mut self) -> bool {
        let transitioned = !self.verified;
        self.verified = true;
        transitioned
    }

    /// Balance left after removing `amount`, if the balance covers it.
    /// The account itself is not touched.
    pub fn debited(&self, amount: Amount) -> Result<Balance, LedgerError> {
        let requested = Balance::from(amount);
        if self.balance < requested {
            return Err(LedgerError::InsufficientFunds {
                account: self.id,
                balance: self.balance,
                requested,
            });
        }
        self.balance
            .checked_sub(amount)
            .ok_or(LedgerError::BalanceOverflow(self.id))
    }

    pub fn credited(&self, amount: Amount) -> Result<Balance, LedgerError> {
        self.balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(self.id))
    }
}
