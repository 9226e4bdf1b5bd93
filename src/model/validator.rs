//! Pluggable policies deciding whether a resulting balance is acceptable.
#![deny(missing_docs)]
#![deny(warnings)]

use crate::model::amount::Amount;

/// Reason a validator gave for refusing a balance.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct Rejection(String);

impl Rejection {
    /// Creates a rejection carrying a human readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// The reason given by the validator.
    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Decides whether an account may end up with a given balance.
///
/// Validators are consulted with the *prospective* balance, before anything is written, so a
/// rejection leaves the account untouched. They run while the account lock is held and must not
/// call back into the ledger.
pub trait BalanceValidator: Send + Sync {
    /// Returns `Err` when `balance` is not acceptable.
    fn validate(&self, balance: Amount) -> Result<(), Rejection>;
}

impl<F> BalanceValidator for F
where
    F: Fn(Amount) -> Result<(), Rejection> + Send + Sync,
{
    fn validate(&self, balance: Amount) -> Result<(), Rejection> {
        self(balance)
    }
}

/// Refuses negative balances. This is the default policy of the server.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonNegative;

impl BalanceValidator for NonNegative {
    fn validate(&self, balance: Amount) -> Result<(), Rejection> {
        if balance.is_negative() {
            return Err(Rejection::new("Not enough funds on the source account"));
        }

        Ok(())
    }
}

/// Allows an overdraft down to `-limit`.
#[derive(Debug, Clone, Copy)]
pub struct CreditLimit(pub Amount);

impl BalanceValidator for CreditLimit {
    fn validate(&self, balance: Amount) -> Result<(), Rejection> {
        let floor = Amount::ZERO.checked_sub(self.0).unwrap_or(Amount::MIN);
        if balance < floor {
            return Err(Rejection::new(format!(
                "Balance {} exceeds the credit limit of {}",
                balance, self.0
            )));
        }

        Ok(())
    }
}

/// Refuses balances above a ceiling.
#[derive(Debug, Clone, Copy)]
pub struct Cap(pub Amount);

impl BalanceValidator for Cap {
    fn validate(&self, balance: Amount) -> Result<(), Rejection> {
        if balance > self.0 {
            return Err(Rejection::new(format!(
                "Balance {} is above the cap of {}",
                balance, self.0
            )));
        }

        Ok(())
    }
}

/// Accepts every balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unchecked;

impl BalanceValidator for Unchecked {
    fn validate(&self, _balance: Amount) -> Result<(), Rejection> {
        Ok(())
    }
}
